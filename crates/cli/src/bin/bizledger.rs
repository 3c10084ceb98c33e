//! bizledger CLI
//!
//! Manages scopes, identities, assets and pull requests on a ledger node.

use anyhow::Context as _;
use bizledger_cli::{commands, config, CliConfig, Command, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bizledger")]
#[command(about = "Scopes, identities, assets and pull requests on a ledger")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.bizledger/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Run against an in-process simulated ledger
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = CliConfig::load(&config_path)?;
    debug!(path = %config_path.display(), "Loaded config");

    let ctx = Context::open(config, cli.simulate)?;
    let name = cli.command.name();
    let result = commands::run(&ctx, cli.command).await;
    ctx.finish()?;
    result.with_context(|| format!("{} failed", name))
}

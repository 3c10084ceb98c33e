//! `bizledger namespace create`

use crate::Context;
use anyhow::Context as _;
use bizledger_planner::PlanningSession;
use bizledger_types::{Deadline, Transaction, DEFAULT_NAME};
use clap::{Args, Subcommand};
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum NamespaceCommand {
    /// Register a namespace and any missing parents
    Create(CreateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Identity registering the namespace, as `scope.name` or a unique name
    #[arg(short, long, default_value = DEFAULT_NAME)]
    pub identity: String,

    /// Namespace, e.g. `acme.widgets` (at most three levels)
    #[arg(short, long)]
    pub name: String,
}

pub async fn run(ctx: &Context, command: NamespaceCommand) -> anyhow::Result<()> {
    match command {
        NamespaceCommand::Create(args) => create(ctx, &args).await.map(|_| ()),
    }
}

/// Register `args.name`. Returns the number of registrations announced,
/// zero when every segment already exists.
pub async fn create(ctx: &Context, args: &CreateArgs) -> anyhow::Result<usize> {
    let identity = ctx.resolve_identity(&args.identity)?;
    let account = ctx
        .gateway
        .get_account_info(&identity.address())
        .await
        .with_context(|| format!("account {} is not known to the ledger", identity.address()))?;
    info!(
        identity = %identity.slug(),
        balances = account.balances.len(),
        "Registering namespace"
    );

    let composer = ctx.composer()?;
    let bundle = composer
        .compose_namespace_registration(
            &mut PlanningSession::new(),
            &identity.public_account(),
            &args.name,
        )
        .await
        .with_context(|| format!("planning namespace {}", args.name))?;
    if bundle.is_empty() {
        println!("Namespace {} is already registered", args.name);
        return Ok(0);
    }

    let registrations = bundle.len();
    let monitors = ctx.monitors(&[identity.address()]).await?;
    let signed = Transaction::aggregate(composer.config().network, Deadline::create(), bundle)
        .sign(&identity.keypair);
    let result = match signed {
        Ok(signed) => ctx.submit(&signed).await,
        Err(e) => Err(e.into()),
    };
    monitors.shutdown().await;
    let height = result?;

    println!(
        "Namespace {} registered at height {} ({} new)",
        args.name, height.0, registrations
    );
    Ok(registrations)
}

//! `bizledger network import`

use crate::Context;
use anyhow::{anyhow, Context as _};
use bizledger_types::{Identity, KeyPair, NetworkType, NEMESIS_NAME, NEMESIS_SCOPE};
use clap::{Args, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Location of the generated accounts inside a bootstrap installation.
pub const ADDRESSES_FILE: &str = "build/generated-addresses/addresses.yaml";

#[derive(Debug, Subcommand)]
pub enum NetworkCommand {
    /// Import the nemesis account of a bootstrap installation
    Import(ImportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    /// Bootstrap installation directory
    #[arg(short, long)]
    pub path: PathBuf,

    /// Network type, defaults to the configured one
    #[arg(short, long)]
    pub network: Option<NetworkType>,

    /// Node url, defaults to the configured one
    #[arg(short, long)]
    pub url: Option<String>,
}

pub fn run(ctx: &Context, command: NetworkCommand) -> anyhow::Result<()> {
    match command {
        NetworkCommand::Import(args) => import(ctx, &args).map(|_| ()),
    }
}

/// Store the bootstrap's first nemesis key as `default.nemesis`.
///
/// Leaves an existing nemesis identity untouched.
pub fn import(ctx: &Context, args: &ImportArgs) -> anyhow::Result<Identity> {
    if ctx.store.contains(NEMESIS_SCOPE, NEMESIS_NAME)? {
        let nemesis = ctx.nemesis()?;
        println!("Nemesis already imported: {}", nemesis.address());
        return Ok(nemesis);
    }

    let file = args.path.join(ADDRESSES_FILE);
    let private_key = read_nemesis_key(&file)?;
    let keypair = KeyPair::from_private_hex(&private_key)
        .with_context(|| format!("invalid nemesis key in {}", file.display()))?;
    let nemesis = ctx.store.save(
        keypair,
        args.network.unwrap_or(ctx.config.network.network_type),
        args.url.as_deref().unwrap_or(&ctx.config.network.url),
        NEMESIS_SCOPE,
        NEMESIS_NAME,
    )?;

    info!(address = %nemesis.address(), source = %file.display(), "Imported nemesis");
    println!("Imported nemesis {}", nemesis.address());
    Ok(nemesis)
}

fn read_nemesis_key(file: &Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading bootstrap addresses {}", file.display()))?;
    nemesis_private_key(&text)
        .with_context(|| format!("parsing bootstrap addresses {}", file.display()))?
        .ok_or_else(|| anyhow!("no nemesis_addresses[].private entry in {}", file.display()))
}

/// The parts of a bootstrap `addresses.yaml` needed for import.
#[derive(Debug, Deserialize)]
struct BootstrapAddresses {
    #[serde(default)]
    nemesis_addresses: Vec<BootstrapAccount>,
}

#[derive(Debug, Deserialize)]
struct BootstrapAccount {
    private: String,
}

/// First `private` key listed under `nemesis_addresses`, if any.
pub fn nemesis_private_key(yaml: &str) -> Result<Option<String>, serde_yaml::Error> {
    let addresses: BootstrapAddresses = serde_yaml::from_str(yaml)?;
    Ok(addresses
        .nemesis_addresses
        .into_iter()
        .map(|account| account.private)
        .find(|key| !key.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESSES: &str = r#"
# generated by bootstrap
peer_nodes:
  - private: 1111111111111111111111111111111111111111111111111111111111111111
    public: AAAA
nemesis_addresses:
  - private: "2222222222222222222222222222222222222222222222222222222222222222"
    public: BBBB
    address: SAAAA
  - private: 3333333333333333333333333333333333333333333333333333333333333AAA
"#;

    #[test]
    fn test_first_nemesis_key_is_picked() {
        assert_eq!(
            nemesis_private_key(ADDRESSES).unwrap().as_deref(),
            Some("2222222222222222222222222222222222222222222222222222222222222222")
        );
    }

    #[test]
    fn test_flow_style_and_quoted_keys() {
        assert_eq!(
            nemesis_private_key(r#"nemesis_addresses: [{private: "2222", public: BBBB}]"#)
                .unwrap()
                .as_deref(),
            Some("2222")
        );
        assert_eq!(
            nemesis_private_key("\"nemesis_addresses\":\n  - \"private\": 'AB12'\n")
                .unwrap()
                .as_deref(),
            Some("AB12")
        );
    }

    #[test]
    fn test_missing_section_yields_none() {
        assert_eq!(
            nemesis_private_key("peer_nodes:\n  - private: 11\n").unwrap(),
            None
        );
        assert_eq!(nemesis_private_key("{}").unwrap(), None);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(nemesis_private_key("nemesis_addresses: [unterminated").is_err());
    }
}

//! Subcommands of the `bizledger` binary.

pub mod asset;
pub mod identity;
pub mod namespace;
pub mod network;
pub mod pull_request;
pub mod scope;

use crate::Context;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or inspect scopes
    #[command(subcommand)]
    Scope(scope::ScopeCommand),

    /// Create, list or remove identities
    #[command(subcommand)]
    Identity(identity::IdentityCommand),

    /// Create assets
    #[command(subcommand)]
    Asset(asset::AssetCommand),

    /// Register namespaces
    #[command(subcommand)]
    Namespace(namespace::NamespaceCommand),

    /// Request assets from another identity through a bonded escrow
    #[command(subcommand)]
    PullRequest(pull_request::PullRequestCommand),

    /// Import network accounts
    #[command(subcommand)]
    Network(network::NetworkCommand),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Scope(_) => "scope",
            Command::Identity(_) => "identity",
            Command::Asset(_) => "asset",
            Command::Namespace(_) => "namespace",
            Command::PullRequest(_) => "pull-request",
            Command::Network(_) => "network",
        }
    }
}

pub async fn run(ctx: &Context, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Scope(command) => scope::run(ctx, command).await,
        Command::Identity(command) => identity::run(ctx, command).await,
        Command::Asset(command) => asset::run(ctx, command).await,
        Command::Namespace(command) => namespace::run(ctx, command).await,
        Command::PullRequest(command) => pull_request::run(ctx, command).await,
        Command::Network(command) => network::run(ctx, command),
    }
}

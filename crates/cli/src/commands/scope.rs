//! `bizledger scope create|show`

use crate::Context;
use anyhow::{bail, Context as _};
use bizledger_planner::PlanningSession;
use bizledger_types::{clean_name, Deadline, Identity, KeyPair, Transaction, OWNER_NAME};
use clap::{Args, Subcommand};
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum ScopeCommand {
    /// Create a scope: its owner identity, funding and namespaces
    Create(ScopeArgs),
    /// Show a scope's owner and members
    Show(ScopeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ScopeArgs {
    /// Scope name
    #[arg(short, long)]
    pub scope: String,
}

pub async fn run(ctx: &Context, command: ScopeCommand) -> anyhow::Result<()> {
    match command {
        ScopeCommand::Create(args) => create(ctx, &args).await.map(|_| ()),
        ScopeCommand::Show(args) => show(ctx, &args),
    }
}

/// Create `args.scope` and return its owner.
///
/// The owner identity is created on first use. Nemesis funds it and the
/// scope's `identities` and `names` namespaces are registered in one
/// aggregate cosigned by the owner.
pub async fn create(ctx: &Context, args: &ScopeArgs) -> anyhow::Result<Identity> {
    let scope = clean_name(&args.scope);
    if scope.is_empty() {
        bail!("scope name {:?} has no usable characters", args.scope);
    }

    let nemesis = ctx.nemesis()?;
    let owner = if ctx.store.contains(&scope, OWNER_NAME)? {
        let owner = ctx.identity(&scope, OWNER_NAME)?;
        info!(scope = %scope, address = %owner.address(), "Reusing scope owner");
        owner
    } else {
        let owner = ctx.store.save(
            KeyPair::generate(),
            ctx.config.network.network_type,
            &ctx.config.network.url,
            &scope,
            OWNER_NAME,
        )?;
        info!(scope = %scope, address = %owner.address(), "Created scope owner");
        owner
    };

    let monitors = ctx.monitors(&[owner.address()]).await?;
    let result = provision(ctx, &nemesis, &owner).await;
    monitors.shutdown().await;
    let height = result?;

    println!("Scope {} created at height {}", scope, height.0);
    println!("  owner:   {}", owner.address());
    println!("  public:  {}", owner.keypair.public_key());
    Ok(owner)
}

async fn provision(
    ctx: &Context,
    nemesis: &Identity,
    owner: &Identity,
) -> anyhow::Result<bizledger_types::BlockHeight> {
    let composer = ctx.composer()?;
    let bundle = composer
        .compose_scope_provisioning(&mut PlanningSession::new(), &nemesis.public_account(), owner)
        .await
        .with_context(|| format!("composing scope {}", owner.scope))?;
    let signed = Transaction::aggregate(composer.config().network, Deadline::create(), bundle)
        .sign_with_cosigners(&nemesis.keypair, &[&owner.keypair])?;
    ctx.submit(&signed).await
}

pub fn show(ctx: &Context, args: &ScopeArgs) -> anyhow::Result<()> {
    let scope = ctx.store.find_scope(&clean_name(&args.scope))?;
    if scope.identities.is_empty() {
        bail!("scope {} has no identities", scope.name);
    }

    println!("Scope {}", scope.name);
    match scope.owner() {
        Some(owner) => {
            println!("  owner:   {}", owner.address());
            println!("  public:  {}", owner.keypair.public_key());
        }
        None => println!("  owner:   (none)"),
    }
    for member in scope.members() {
        println!("  - {}", member.name);
        println!("      address: {}", member.address());
        println!("      alias:   {}", member.address_alias()?);
        println!("      badge:   {}", member.asset_alias()?);
    }
    Ok(())
}

//! `bizledger identity create|list|remove`

use crate::Context;
use anyhow::{bail, Context as _};
use bizledger_planner::PlanningSession;
use bizledger_store::{IdentityFilter, ANY_SCOPE};
use bizledger_types::{
    clean_identity_name, clean_name, slug, AssetAmount, AssetNonce, Deadline, Identity, KeyPair,
    NetworkType, Transaction, OWNER_NAME,
};
use clap::{Args, Subcommand};
use tracing::{info, warn};

#[derive(Debug, Subcommand)]
pub enum IdentityCommand {
    /// Create a named identity in a scope
    Create(CreateArgs),
    /// List stored identities
    List(ListArgs),
    /// Remove a stored identity
    Remove(RemoveArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Identity name
    #[arg(short, long)]
    pub name: String,

    /// Scope the identity belongs to
    #[arg(short, long)]
    pub scope: String,

    /// Network type (MAIN_NET, TEST_NET, MIJIN, MIJIN_TEST), defaults to the configured one
    #[arg(short = 'c', long)]
    pub network: Option<NetworkType>,

    /// Node url recorded on the identity, defaults to the configured one
    #[arg(short, long)]
    pub url: Option<String>,

    /// Keep the identity off-ledger: no aliases and no badge
    #[arg(short, long)]
    pub local: bool,

    /// Assets sent from the scope owner, e.g. "1000000 cat.currency"
    #[arg(short, long)]
    pub assets: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Scope to list, `*` for all
    #[arg(short, long, default_value = ANY_SCOPE)]
    pub scope: String,

    /// Only the identity with this name
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct RemoveArgs {
    #[arg(short, long)]
    pub scope: String,

    #[arg(short, long)]
    pub name: String,
}

pub async fn run(ctx: &Context, command: IdentityCommand) -> anyhow::Result<()> {
    match command {
        IdentityCommand::Create(args) => create(ctx, &args).await.map(|_| ()),
        IdentityCommand::List(args) => {
            for identity in list(ctx, &args)? {
                print_identity(&identity);
            }
            Ok(())
        }
        IdentityCommand::Remove(args) => {
            let removed = remove(ctx, &args)?;
            println!("Removed identity {}", removed.slug());
            Ok(())
        }
    }
}

/// Create an identity and, unless it stays local without funding, make it
/// known on the ledger through a bundle issued by the scope owner.
pub async fn create(ctx: &Context, args: &CreateArgs) -> anyhow::Result<Identity> {
    let scope = clean_name(&args.scope);
    if scope.is_empty() {
        bail!("scope name {:?} has no usable characters", args.scope);
    }
    let name = clean_identity_name(&args.name);
    if name == OWNER_NAME {
        bail!("the owner identity is created by `bizledger scope create`");
    }
    if ctx.store.contains(&scope, &name)? {
        bail!("identity {} already exists", slug(&scope, &name));
    }
    let funding = args
        .assets
        .as_deref()
        .map(AssetAmount::parse)
        .transpose()
        .context("invalid --assets")?;

    let network = args.network.unwrap_or(ctx.config.network.network_type);
    let url = args.url.as_deref().unwrap_or(&ctx.config.network.url);

    if args.local && funding.is_none() {
        let identity = ctx
            .store
            .save(KeyPair::generate(), network, url, &scope, &name)?;
        info!(identity = %identity.slug(), "Created local identity");
        print_identity(&identity);
        return Ok(identity);
    }

    let owner = ctx.scope_owner(&scope)?;
    let identity = ctx
        .store
        .save(KeyPair::generate(), network, url, &scope, &name)?;
    info!(identity = %identity.slug(), local = args.local, "Created identity");

    let result = match ctx.monitors(&[owner.address(), identity.address()]).await {
        Ok(monitors) => {
            let result = provision(ctx, &owner, &identity, funding, args.local).await;
            monitors.shutdown().await;
            result
        }
        Err(e) => Err(e),
    };
    let height = match result {
        Ok(height) => height,
        Err(e) => {
            // Unprovisioned identities are not kept.
            if let Err(remove_error) = ctx.store.remove(&identity.slug()) {
                warn!(
                    identity = %identity.slug(),
                    error = %remove_error,
                    "Failed to remove unprovisioned identity"
                );
            }
            return Err(e);
        }
    };

    println!("Identity {} provisioned at height {}", identity.slug(), height.0);
    print_identity(&identity);
    Ok(identity)
}

async fn provision(
    ctx: &Context,
    owner: &Identity,
    identity: &Identity,
    funding: Option<AssetAmount>,
    local: bool,
) -> anyhow::Result<bizledger_types::BlockHeight> {
    let composer = ctx.composer()?;
    let bundle = composer
        .compose_identity_provisioning(
            &mut PlanningSession::new(),
            &owner.public_account(),
            identity,
            funding,
            local,
            AssetNonce::random(),
        )
        .await
        .with_context(|| format!("composing identity {}", identity.slug()))?;
    let signed = Transaction::aggregate(composer.config().network, Deadline::create(), bundle)
        .sign(&owner.keypair)?;
    ctx.submit(&signed).await
}

pub fn list(ctx: &Context, args: &ListArgs) -> anyhow::Result<Vec<Identity>> {
    let name = args.name.as_deref().map(clean_identity_name);
    let filter = IdentityFilter::new(Some(&args.scope), name.as_deref());
    Ok(ctx.store.list(&filter)?)
}

pub fn remove(ctx: &Context, args: &RemoveArgs) -> anyhow::Result<Identity> {
    let slug = slug(&clean_name(&args.scope), &clean_identity_name(&args.name));
    ctx.store
        .remove(&slug)
        .with_context(|| format!("removing identity {}", slug))
}

fn print_identity(identity: &Identity) {
    println!("{}", identity.slug());
    println!("  scope:   {}", identity.scope);
    println!("  name:    {}", identity.name);
    println!("  network: {}", identity.network);
    println!("  url:     {}", identity.url);
    println!("  address: {}", identity.address());
    println!("  public:  {}", identity.keypair.public_key());
}

//! `bizledger asset create`

use crate::Context;
use anyhow::Context as _;
use bizledger_composer::AssetCreation;
use bizledger_planner::PlanningSession;
use bizledger_types::{
    Amount, AssetDefinition, AssetNonce, Deadline, Recipient, Transaction, DEFAULT_NAME,
};
use clap::{ArgAction, Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum AssetCommand {
    /// Create an asset owned by your scope's owner
    Create(CreateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Identity creating the asset, as `scope.name` or a unique name
    #[arg(short, long, default_value = DEFAULT_NAME)]
    pub identity: String,

    /// Asset name, e.g. `acme.cat` (at most three levels)
    #[arg(short, long)]
    pub name: String,

    /// Decimal places, 0 to 6
    #[arg(short, long, default_value_t = 0)]
    pub divisibility: u8,

    /// Allow the supply to change after creation
    #[arg(short, long)]
    pub supply_mutable: bool,

    /// Allow holders other than the owner to transfer the asset
    #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
    pub transferable: bool,

    /// Initial supply in absolute units: decimal, `0x` hex or `[lower, higher]`
    #[arg(short = 'q', long)]
    pub initial_supply: Amount,

    /// Where the initial supply goes (address or namespace). Defaults to the
    /// creating identity; nothing is sent when that is the owner itself.
    #[arg(short, long)]
    pub recipient: Option<String>,
}

pub async fn run(ctx: &Context, command: AssetCommand) -> anyhow::Result<()> {
    match command {
        AssetCommand::Create(args) => create(ctx, &args).await,
    }
}

pub async fn create(ctx: &Context, args: &CreateArgs) -> anyhow::Result<()> {
    let user = ctx.resolve_identity(&args.identity)?;
    let owner = ctx.scope_owner(&user.scope)?;
    let recipient = match &args.recipient {
        Some(reference) => Some(
            Recipient::parse(reference)
                .with_context(|| format!("invalid --recipient {:?}", reference))?,
        ),
        None if user.address() != owner.address() => Some(user.address().into()),
        None => None,
    };
    let creation = AssetCreation {
        name: args.name.clone(),
        definition: AssetDefinition::new(args.divisibility, args.supply_mutable, args.transferable),
        initial_supply: args.initial_supply,
        recipient,
        nonce: AssetNonce::random(),
    };

    let monitors = ctx.monitors(&[owner.address()]).await?;
    let result = async {
        let composer = ctx.composer()?;
        let bundle = composer
            .compose_asset_creation(&mut PlanningSession::new(), &owner.public_account(), creation)
            .await
            .with_context(|| format!("composing asset {}", args.name))?;
        let signed = Transaction::aggregate(composer.config().network, Deadline::create(), bundle)
            .sign(&owner.keypair)?;
        ctx.submit(&signed).await
    }
    .await;
    monitors.shutdown().await;
    let height = result?;

    println!(
        "Asset {} created at height {} with supply {}",
        args.name, height.0, args.initial_supply
    );
    Ok(())
}

//! `bizledger pull-request create`

use crate::Context;
use anyhow::Context as _;
use bizledger_core::EscrowNotification;
use bizledger_escrow::{EscrowRequest, EscrowRunner, EscrowStateMachine};
use bizledger_types::{Amount, AssetRef, Deadline, Hash, DEFAULT_NAME, OWNER_NAME};
use clap::{Args, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Subcommand)]
pub enum PullRequestCommand {
    /// Ask an identity to send you assets; both sides sign locally
    Create(CreateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Requesting identity, as `scope.name` or a unique name
    #[arg(short, long, default_value = DEFAULT_NAME)]
    pub identity: String,

    /// Identity asked to pay: a name in the requester's scope or `scope.name`
    #[arg(short, long, default_value = OWNER_NAME)]
    pub recipient: String,

    /// Asset requested (namespace name or asset id)
    #[arg(short = 'n', long)]
    pub asset: String,

    /// Amount requested in absolute units: decimal, `0x` hex or `[lower, higher]`
    #[arg(short, long)]
    pub amount: Amount,

    /// Bound on each confirmation wait (e.g. "90s", "5m")
    #[arg(short, long)]
    pub timeout: Option<humantime::Duration>,
}

pub async fn run(ctx: &Context, command: PullRequestCommand) -> anyhow::Result<()> {
    match command {
        PullRequestCommand::Create(args) => create(ctx, &args).await.map(|_| ()),
    }
}

/// Run the hash-lock, bonded aggregate and cosignature flow to completion.
/// Returns the aggregate hash.
pub async fn create(ctx: &Context, args: &CreateArgs) -> anyhow::Result<Hash> {
    let requester = ctx.resolve_identity(&args.identity)?;
    let recipient = match args.recipient.split_once('.') {
        Some((scope, name)) => ctx.identity(scope, name)?,
        None => ctx.identity(&requester.scope, &args.recipient)?,
    };
    let asset =
        AssetRef::parse(&args.asset).with_context(|| format!("invalid --asset {:?}", args.asset))?;

    let mut config = ctx.escrow_config();
    if let Some(timeout) = args.timeout.as_deref() {
        config = config.with_confirmation_timeout(*timeout);
    }
    let request_timeout = config.confirmation_timeout;

    let composer = ctx.composer()?;
    let request = EscrowRequest {
        requester: requester.clone(),
        recipient: recipient.clone(),
        asset,
        amount: args.amount,
        deadline: Deadline::create(),
    };
    let machine =
        EscrowStateMachine::new(config, &composer, request).context("preparing pull request")?;
    let (runner, mut notifications) =
        EscrowRunner::new(ctx.gateway.clone(), machine, request_timeout);

    let monitors = ctx
        .monitors(&[requester.address(), recipient.address()])
        .await?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling pull request");
                cancel.cancel();
            }
        })
    };
    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            println!("{}", describe(&notification));
        }
    });

    let result = runner.run(cancel).await;
    interrupt.abort();
    if let Err(e) = printer.await {
        warn!(error = %e, "Progress printer ended abnormally");
    }
    monitors.shutdown().await;

    let aggregate_hash = result.context("pull request failed")?;
    println!(
        "{} sent {} {} to {}",
        recipient.slug(),
        args.amount,
        args.asset,
        requester.slug()
    );
    Ok(aggregate_hash)
}

fn describe(notification: &EscrowNotification) -> String {
    match notification {
        EscrowNotification::HashLockAnnounced { lock_hash } => {
            format!("Hash lock {} announced", lock_hash)
        }
        EscrowNotification::HashLockConfirmed { lock_hash } => {
            format!("Hash lock {} confirmed", lock_hash)
        }
        EscrowNotification::BondedAnnounced { aggregate_hash } => {
            format!("Pull request {} announced", aggregate_hash)
        }
        EscrowNotification::Cosigned { aggregate_hash } => {
            format!("Pull request {} cosigned", aggregate_hash)
        }
        EscrowNotification::Completed { aggregate_hash } => {
            format!("Pull request {} complete", aggregate_hash)
        }
        EscrowNotification::Failed { error } => format!("Pull request failed: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizledger_core::EscrowError;

    #[test]
    fn test_describe_mentions_hash_and_error() {
        let hash = Hash::from_bytes(b"aggregate");
        assert_eq!(
            describe(&EscrowNotification::Cosigned {
                aggregate_hash: hash
            }),
            format!("Pull request {} cosigned", hash)
        );
        assert_eq!(
            describe(&EscrowNotification::Failed {
                error: EscrowError::Cancelled
            }),
            "Pull request failed: Escrow flow was cancelled"
        );
    }
}

//! Actions emitted by the escrow state machine.

use crate::{AnnounceStage, GatewayError};
use bizledger_types::{Address, CosignatureSigned, Hash, PublicAccount, SignedTransaction};
use std::fmt;
use std::time::Duration;

/// Timers the state machine can arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Bound on waiting for the hash lock to confirm.
    LockConfirmation,
    /// Bound on waiting for the bonded aggregate to show up as pending.
    BondedVisibility,
    /// Retry the pending-bonded lookup.
    PendingPoll,
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerId::LockConfirmation => "hash lock confirmation",
            TimerId::BondedVisibility => "bonded aggregate visibility",
            TimerId::PendingPoll => "pending poll",
        };
        f.write_str(name)
    }
}

/// Work the runner performs on behalf of the state machine.
#[derive(Debug, Clone)]
pub enum Action {
    /// Open an event subscription for `address`.
    Subscribe { address: Address },

    /// Announce the hash lock.
    Announce { transaction: SignedTransaction },

    /// Announce the bonded aggregate.
    AnnounceBonded { transaction: SignedTransaction },

    /// List bonded aggregates awaiting `cosigner`.
    FetchPendingBonded { cosigner: PublicAccount },

    /// Announce a cosignature.
    AnnounceCosignature { cosignature: CosignatureSigned },

    /// Arm a timer, replacing any timer with the same id.
    SetTimer { id: TimerId, duration: Duration },

    /// Disarm a timer.
    CancelTimer { id: TimerId },

    /// Report progress to the caller.
    Notify(EscrowNotification),
}

impl Action {
    /// Get the action type name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Subscribe { .. } => "Subscribe",
            Action::Announce { .. } => "Announce",
            Action::AnnounceBonded { .. } => "AnnounceBonded",
            Action::FetchPendingBonded { .. } => "FetchPendingBonded",
            Action::AnnounceCosignature { .. } => "AnnounceCosignature",
            Action::SetTimer { .. } => "SetTimer",
            Action::CancelTimer { .. } => "CancelTimer",
            Action::Notify(_) => "Notify",
        }
    }
}

/// Progress of an escrow flow, in the order a successful flow emits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowNotification {
    HashLockAnnounced { lock_hash: Hash },
    HashLockConfirmed { lock_hash: Hash },
    BondedAnnounced { aggregate_hash: Hash },
    Cosigned { aggregate_hash: Hash },
    Completed { aggregate_hash: Hash },
    Failed { error: EscrowError },
}

impl EscrowNotification {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EscrowNotification::Completed { .. } | EscrowNotification::Failed { .. }
        )
    }
}

/// Why an escrow flow failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscrowError {
    #[error("Announcing the {stage} failed: {source}")]
    Announce {
        stage: AnnounceStage,
        #[source]
        source: GatewayError,
    },

    #[error("Hash lock {lock_hash} was rejected by the ledger: {status}")]
    LockRejected { lock_hash: Hash, status: String },

    #[error("Bonded aggregate {aggregate_hash} was rejected by the ledger: {status}")]
    BondedRejected { aggregate_hash: Hash, status: String },

    #[error("Timed out waiting for {waiting_for}")]
    UnresolvedConfirmation { waiting_for: TimerId },

    #[error("Subscribing to ledger events failed: {0}")]
    Subscribe(#[source] GatewayError),

    #[error("Fetching pending bonded aggregates failed: {0}")]
    FetchPending(#[source] GatewayError),

    #[error("Escrow flow was cancelled")]
    Cancelled,
}

//! Events fed into the escrow state machine.

use crate::{Ack, GatewayError, LedgerEvent, TimerId};
use bizledger_types::SignedTransaction;
use std::fmt;

/// Which announcement an acknowledgement or rejection refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnounceStage {
    HashLock,
    Bonded,
    Cosignature,
}

impl fmt::Display for AnnounceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnnounceStage::HashLock => "hash lock",
            AnnounceStage::Bonded => "bonded aggregate",
            AnnounceStage::Cosignature => "cosignature",
        };
        f.write_str(name)
    }
}

/// All inputs the escrow state machine reacts to.
///
/// Apart from `Start`, every event is the runner reporting back the outcome
/// of an [`Action`](crate::Action) or something it observed on the ledger.
#[derive(Debug, Clone)]
pub enum Event {
    /// Kick off the protocol.
    Start,

    /// The address subscription is live.
    Subscribed,

    /// Opening the address subscription failed.
    SubscribeFailed { error: GatewayError },

    /// The gateway accepted an announcement.
    Announced { stage: AnnounceStage, ack: Ack },

    /// The gateway rejected an announcement.
    AnnounceFailed {
        stage: AnnounceStage,
        error: GatewayError,
    },

    /// An event from the requester's address subscription.
    Ledger(LedgerEvent),

    /// Result of a pending-bonded lookup for the recipient.
    PendingBonded(Vec<SignedTransaction>),

    /// The pending-bonded lookup failed.
    PendingFetchFailed { error: GatewayError },

    /// A timer set via `Action::SetTimer` fired.
    Timer(TimerId),

    /// The caller cancelled the flow.
    Cancelled,
}

impl Event {
    /// Get the event type name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Start => "Start",
            Event::Subscribed => "Subscribed",
            Event::SubscribeFailed { .. } => "SubscribeFailed",
            Event::Announced { .. } => "Announced",
            Event::AnnounceFailed { .. } => "AnnounceFailed",
            Event::Ledger(_) => "Ledger",
            Event::PendingBonded(_) => "PendingBonded",
            Event::PendingFetchFailed { .. } => "PendingFetchFailed",
            Event::Timer(_) => "Timer",
            Event::Cancelled => "Cancelled",
        }
    }
}

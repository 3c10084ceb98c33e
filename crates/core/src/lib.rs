//! Core abstractions for bizledger.
//!
//! - [`LedgerGateway`]: the async capability set every ledger backend implements.
//! - [`StateMachine`]: the synchronous, deterministic protocol interface.
//! - [`Event`] / [`Action`]: what the escrow state machine consumes and emits.

mod action;
mod event;
mod gateway;
mod traits;

pub use action::{Action, EscrowError, EscrowNotification, TimerId};
pub use event::{AnnounceStage, Event};
pub use gateway::{
    Ack, AccountInfo, AliasTarget, AssetBalance, BlockInfo, BlockSubscription, EventStream,
    GatewayError, LedgerEvent, LedgerGateway, NamespaceInfo, Subscription,
};
pub use traits::StateMachine;

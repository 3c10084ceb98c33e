//! The ledger as seen by the rest of the system.
//!
//! [`LedgerGateway`] is the only way bizledger talks to a ledger. It covers
//! announcing signed transactions and cosignatures, reading namespace and
//! account state, and subscribing to per-address and per-block event streams.

use async_trait::async_trait;
use bizledger_types::{
    Address, Amount, AssetId, BlockHeight, CosignatureSigned, Hash, NamespaceId, NamespacePath,
    PublicAccount, PublicKey, SignedTransaction,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;

/// Errors returned by a gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The queried namespace or account does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The ledger refused the request (validation, insufficient funds, ...).
    #[error("Rejected by ledger: {0}")]
    Rejected(String),

    /// The ledger could not be reached or answered garbage.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The gateway or subscription was shut down.
    #[error("Gateway closed")]
    Closed,
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}

/// Acknowledgement that an announcement was accepted for processing.
///
/// Acceptance is not confirmation: the transaction may still fail
/// validation, reported later as [`LedgerEvent::StatusError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub hash: Hash,
}

/// What a namespace alias points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasTarget {
    Address(Address),
    Asset(AssetId),
}

/// Registered namespace state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub path: NamespacePath,
    pub id: NamespaceId,
    pub owner: Address,
    pub alias: Option<AliasTarget>,
    /// Height at which the root rental expires.
    pub expires_at: BlockHeight,
}

/// Balance of a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset_id: AssetId,
    pub amount: Amount,
}

/// Account state known to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    /// Unknown until the account has signed something.
    pub public_key: Option<PublicKey>,
    /// Height at which the ledger first saw the account.
    pub height: BlockHeight,
    pub balances: Vec<AssetBalance>,
}

impl AccountInfo {
    pub fn balance(&self, asset_id: AssetId) -> Amount {
        self.balances
            .iter()
            .find(|b| b.asset_id == asset_id)
            .map(|b| b.amount)
            .unwrap_or(Amount::ZERO)
    }
}

/// Event observed on an address subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A transaction involving the address was included in a block.
    Confirmed { hash: Hash, height: BlockHeight },
    /// A transaction involving the address entered the unconfirmed pool.
    UnconfirmedAdded { hash: Hash },
    /// A transaction signed by the address failed validation.
    StatusError { hash: Hash, status: String },
    /// A cosignature was added to a bonded aggregate involving the address.
    CosignatureAdded { parent_hash: Hash, signer: PublicKey },
    /// A bonded aggregate involving the address is awaiting cosignatures.
    BondedAdded { hash: Hash },
}

impl LedgerEvent {
    /// Transaction the event refers to.
    pub fn hash(&self) -> Hash {
        match self {
            LedgerEvent::Confirmed { hash, .. }
            | LedgerEvent::UnconfirmedAdded { hash }
            | LedgerEvent::StatusError { hash, .. }
            | LedgerEvent::BondedAdded { hash } => *hash,
            LedgerEvent::CosignatureAdded { parent_hash, .. } => *parent_hash,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            LedgerEvent::Confirmed { .. } => "Confirmed",
            LedgerEvent::UnconfirmedAdded { .. } => "UnconfirmedAdded",
            LedgerEvent::StatusError { .. } => "StatusError",
            LedgerEvent::CosignatureAdded { .. } => "CosignatureAdded",
            LedgerEvent::BondedAdded { .. } => "BondedAdded",
        }
    }
}

/// A produced block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: BlockHeight,
    pub hash: Hash,
    pub transactions: usize,
}

/// Stream of events for one address.
///
/// The stream stays open until the subscription is dropped or
/// [`Subscription::close`] is called. Any background task feeding it is
/// stopped at that point.
pub struct EventStream<T> {
    receiver: mpsc::Receiver<T>,
    _guard: Option<DropGuard>,
}

impl<T> EventStream<T> {
    /// Wrap a channel fed directly by the gateway.
    pub fn new(receiver: mpsc::Receiver<T>) -> Self {
        Self {
            receiver,
            _guard: None,
        }
    }

    /// Wrap a channel fed by a background task that must stop with the stream.
    pub fn with_guard(receiver: mpsc::Receiver<T>, guard: DropGuard) -> Self {
        Self {
            receiver,
            _guard: Some(guard),
        }
    }

    /// Next event, `None` once the gateway side closed.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Stop receiving.
    pub fn close(mut self) {
        self.receiver.close();
    }
}

impl<T> std::fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("polled", &self._guard.is_some())
            .finish()
    }
}

/// Per-address event stream.
pub type Subscription = EventStream<LedgerEvent>;

/// New-block stream.
pub type BlockSubscription = EventStream<BlockInfo>;

/// Capability set for interacting with a ledger.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Announce a signed transaction (single operation or complete aggregate).
    async fn announce(&self, transaction: &SignedTransaction) -> Result<Ack, GatewayError>;

    /// Announce a bonded aggregate. Its hash lock must already be confirmed.
    async fn announce_bonded(&self, transaction: &SignedTransaction) -> Result<Ack, GatewayError>;

    /// Announce a detached cosignature for a pending bonded aggregate.
    async fn announce_cosignature(
        &self,
        cosignature: &CosignatureSigned,
    ) -> Result<Ack, GatewayError>;

    /// Look up a registered namespace. [`GatewayError::NotFound`] if absent.
    async fn get_namespace(&self, path: &NamespacePath) -> Result<NamespaceInfo, GatewayError>;

    /// Look up an account.
    async fn get_account_info(&self, address: &Address) -> Result<AccountInfo, GatewayError>;

    /// Subscribe to events involving `address`.
    async fn subscribe(&self, address: &Address) -> Result<Subscription, GatewayError>;

    /// Subscribe to newly produced blocks.
    async fn subscribe_blocks(&self) -> Result<BlockSubscription, GatewayError>;

    /// Bonded aggregates that list `account` as a cosigner.
    async fn pending_bonded_aggregates(
        &self,
        account: &PublicAccount,
    ) -> Result<Vec<SignedTransaction>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_stream_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream: Subscription = EventStream::new(rx);
        let hash = Hash::from_bytes(b"lock");
        tx.send(LedgerEvent::UnconfirmedAdded { hash }).await.unwrap();
        drop(tx);

        assert_eq!(stream.recv().await.map(|e| e.hash()), Some(hash));
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropping_guarded_stream_cancels_feeder() {
        let token = tokio_util::sync::CancellationToken::new();
        let (_tx, rx) = mpsc::channel::<BlockInfo>(1);
        let stream = EventStream::with_guard(rx, token.clone().drop_guard());
        assert!(!token.is_cancelled());
        drop(stream);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_ledger_event_serializes_tagged() {
        let event = LedgerEvent::StatusError {
            hash: Hash::from_bytes(b"x"),
            status: "Failure_Core_Insufficient_Balance".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_error");
        let back: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}

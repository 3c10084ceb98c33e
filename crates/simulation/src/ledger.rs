//! In-process ledger implementing [`LedgerGateway`].

use crate::state::{HashLockRecord, LedgerState};
use crate::SimulationConfig;
use async_trait::async_trait;
use bizledger_core::{
    AccountInfo, Ack, BlockInfo, BlockSubscription, EventStream, GatewayError, LedgerEvent,
    LedgerGateway, NamespaceInfo, Subscription,
};
use bizledger_types::{
    Address, Amount, AssetId, BlockHeight, CosignatureSigned, Hash, NamespacePath, Operation,
    PublicAccount, SignedTransaction, TransactionBody,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Kind of announcement accepted by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionKind {
    Transaction,
    Bonded,
    Cosignature,
}

/// Record of an accepted announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub kind: SubmissionKind,
    /// Transaction hash, or the parent hash for cosignatures.
    pub hash: Hash,
    /// Chain height when the announcement was accepted.
    pub height: BlockHeight,
}

/// Errors loading or saving a ledger snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistable ledger contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    state: LedgerState,
    pool: Vec<SignedTransaction>,
    pending: Vec<SignedTransaction>,
}

#[derive(Debug, Default)]
struct Faults {
    namespace_lookups_failing: bool,
    reject_next: HashMap<SubmissionKind, String>,
    hidden_pending_polls: usize,
}

struct Inner {
    state: LedgerState,
    /// Accepted transactions waiting for the next block.
    pool: Vec<SignedTransaction>,
    /// Bonded aggregates waiting for cosignatures.
    pending: IndexMap<Hash, SignedTransaction>,
    subscribers: HashMap<Address, Vec<mpsc::Sender<LedgerEvent>>>,
    block_subscribers: Vec<mpsc::Sender<BlockInfo>>,
    auto_confirm: bool,
    faults: Faults,
    namespace_lookups: usize,
    submissions: Vec<Submission>,
}

impl Inner {
    fn emit(&mut self, address: &Address, event: LedgerEvent) {
        let Some(senders) = self.subscribers.get_mut(address) else {
            return;
        };
        senders.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(address = %address, event = event.type_name(), "Subscriber lagging, event dropped");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        if senders.is_empty() {
            self.subscribers.remove(address);
        }
    }

    fn emit_all(&mut self, addresses: &[Address], event: LedgerEvent) {
        for address in addresses {
            self.emit(address, event.clone());
        }
    }

    /// Signers plus every recipient that resolves against current state.
    fn involved(&self, transaction: &SignedTransaction) -> Vec<Address> {
        let mut addresses = vec![transaction.transaction.signer.address];
        let mut add = |address: Address| {
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        };
        let mut visit = |operation: &Operation| {
            if let Operation::Transfer { recipient, .. } = operation {
                if let Ok(address) = self.state.resolve_recipient(recipient) {
                    add(address);
                }
            }
        };
        match &transaction.transaction.body {
            TransactionBody::Single(operation) => visit(operation),
            TransactionBody::Aggregate(bundle) => {
                for inner in &bundle.operations {
                    visit(&inner.operation);
                }
            }
        }
        if let Some(bundle) = transaction.transaction.bundle() {
            for inner in &bundle.operations {
                if !addresses.contains(&inner.signer.address) {
                    addresses.push(inner.signer.address);
                }
            }
        }
        addresses
    }

    fn take_rejection(&mut self, kind: SubmissionKind) -> Result<(), GatewayError> {
        match self.faults.reject_next.remove(&kind) {
            Some(reason) => Err(GatewayError::Rejected(reason)),
            None => Ok(()),
        }
    }

    fn check_duplicate(&self, hash: &Hash) -> Result<(), GatewayError> {
        let known = self.state.is_confirmed(hash)
            || self.pending.contains_key(hash)
            || self.pool.iter().any(|tx| tx.hash == *hash);
        if known {
            return Err(GatewayError::Rejected(format!(
                "Failure_Core_Duplicate_Transaction {}",
                hash
            )));
        }
        Ok(())
    }

    fn record(&mut self, kind: SubmissionKind, hash: Hash) {
        self.submissions.push(Submission {
            kind,
            hash,
            height: self.state.height,
        });
    }

    fn enqueue(&mut self, transaction: SignedTransaction) {
        let involved = self.involved(&transaction);
        self.emit_all(
            &involved,
            LedgerEvent::UnconfirmedAdded {
                hash: transaction.hash,
            },
        );
        self.pool.push(transaction);
    }

    fn produce_block(&mut self) -> BlockInfo {
        self.state.height = self.state.height.next();
        let height = self.state.height;
        let transactions = std::mem::take(&mut self.pool);
        let mut included = Vec::with_capacity(transactions.len());

        for transaction in &transactions {
            let mut next = self.state.clone();
            match next.apply(transaction) {
                Ok(touched) => {
                    self.state = next;
                    included.push(transaction.hash);
                    debug!(hash = %transaction.hash, height = height.0, "Transaction confirmed");
                    self.emit_all(
                        &touched,
                        LedgerEvent::Confirmed {
                            hash: transaction.hash,
                            height,
                        },
                    );
                }
                Err(rejection) => {
                    warn!(
                        hash = %transaction.hash,
                        status = %rejection,
                        "Transaction failed validation"
                    );
                    self.emit(
                        &transaction.transaction.signer.address,
                        LedgerEvent::StatusError {
                            hash: transaction.hash,
                            status: rejection.to_string(),
                        },
                    );
                }
            }
        }

        for lock_hash in self.state.expire_locks() {
            debug!(lock_hash = %lock_hash, "Hash lock expired");
            if let Some(aggregate) = self.pending.shift_remove(&lock_hash) {
                self.emit(
                    &aggregate.transaction.signer.address,
                    LedgerEvent::StatusError {
                        hash: lock_hash,
                        status: "Failure_LockHash_Expired".to_string(),
                    },
                );
            }
        }

        let mut preimage = height.0.to_le_bytes().to_vec();
        for hash in &included {
            preimage.extend_from_slice(hash.as_bytes());
        }
        let block = BlockInfo {
            height,
            hash: Hash::from_bytes(&preimage),
            transactions: included.len(),
        };
        self.block_subscribers
            .retain(|sender| !matches!(sender.try_send(block), Err(TrySendError::Closed(_))));
        debug!(height = height.0, transactions = block.transactions, "Block produced");
        block
    }
}

/// A deterministic ledger living in process memory.
///
/// Announcements are validated for signatures and network, queued, and
/// applied atomically when a block is produced. Subscribers receive the same
/// kinds of events a node would push. Faults can be injected to exercise
/// error paths.
pub struct SimulatedLedger {
    config: SimulationConfig,
    inner: Mutex<Inner>,
}

impl SimulatedLedger {
    /// Create a ledger at genesis, with the currency held by `nemesis`.
    pub fn new(config: SimulationConfig, nemesis: &PublicAccount) -> Self {
        let state = LedgerState::genesis(
            nemesis,
            &config.currency,
            config.currency_divisibility,
            config.nemesis_balance,
        );
        Self::from_parts(config, state, Vec::new(), Vec::new())
    }

    /// Restore a ledger from a snapshot.
    pub fn restore(config: SimulationConfig, snapshot: LedgerSnapshot) -> Self {
        Self::from_parts(config, snapshot.state, snapshot.pool, snapshot.pending)
    }

    /// Load the snapshot at `path`, or start from genesis if there is none.
    pub fn load_or_genesis(
        path: &Path,
        config: SimulationConfig,
        nemesis: &PublicAccount,
    ) -> Result<Self, SimulationError> {
        if !path.exists() {
            info!(path = %path.display(), "No ledger snapshot, starting from genesis");
            return Ok(Self::new(config, nemesis));
        }
        let bytes = std::fs::read(path)?;
        let snapshot: LedgerSnapshot = serde_json::from_slice(&bytes)?;
        Ok(Self::restore(config, snapshot))
    }

    /// Write the current snapshot to `path`.
    pub fn save(&self, path: &Path) -> Result<(), SimulationError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(&self.snapshot())?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn from_parts(
        config: SimulationConfig,
        state: LedgerState,
        pool: Vec<SignedTransaction>,
        pending: Vec<SignedTransaction>,
    ) -> Self {
        let inner = Inner {
            state,
            pool,
            pending: pending.into_iter().map(|tx| (tx.hash, tx)).collect(),
            subscribers: HashMap::new(),
            block_subscribers: Vec::new(),
            auto_confirm: config.auto_confirm,
            faults: Faults::default(),
            namespace_lookups: 0,
            submissions: Vec::new(),
        };
        Self {
            config,
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.lock();
        LedgerSnapshot {
            state: inner.state.clone(),
            pool: inner.pool.clone(),
            pending: inner.pending.values().cloned().collect(),
        }
    }

    /// Apply every queued transaction in a new block.
    pub fn produce_block(&self) -> BlockInfo {
        self.lock().produce_block()
    }

    /// Produce a block every `interval` until `cancel` fires.
    pub fn spawn_block_producer(
        self: Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.produce_block();
                    }
                }
            }
        })
    }

    /// Enable or disable producing a block after every announcement.
    pub fn set_auto_confirm(&self, auto_confirm: bool) {
        self.lock().auto_confirm = auto_confirm;
    }

    /// Make namespace lookups fail with a transport error.
    pub fn set_namespace_lookups_failing(&self, failing: bool) {
        self.lock().faults.namespace_lookups_failing = failing;
    }

    /// Reject the next announcement of `kind` with `reason`.
    pub fn reject_next(&self, kind: SubmissionKind, reason: impl Into<String>) {
        self.lock().faults.reject_next.insert(kind, reason.into());
    }

    /// Answer the next `polls` pending-bonded lookups with an empty list.
    pub fn hide_pending_bonded(&self, polls: usize) {
        self.lock().faults.hidden_pending_polls = polls;
    }

    /// Credit network currency to `address` outside of any transaction.
    pub fn credit(&self, address: Address, amount: Amount) {
        let mut inner = self.lock();
        let currency = inner.state.currency;
        inner.state.credit(address, currency, amount);
    }

    pub fn currency_id(&self) -> AssetId {
        self.lock().state.currency
    }

    pub fn height(&self) -> BlockHeight {
        self.lock().state.height
    }

    pub fn balance(&self, address: &Address, asset_id: AssetId) -> Amount {
        self.lock().state.balance(address, asset_id)
    }

    pub fn namespace(&self, path: &NamespacePath) -> Option<NamespaceInfo> {
        self.lock().state.namespace(path).cloned()
    }

    pub fn hash_lock(&self, lock_hash: &Hash) -> Option<HashLockRecord> {
        self.lock().state.lock(lock_hash).cloned()
    }

    pub fn is_confirmed(&self, hash: &Hash) -> bool {
        self.lock().state.is_confirmed(hash)
    }

    /// Number of namespace lookups served so far.
    pub fn namespace_lookups(&self) -> usize {
        self.lock().namespace_lookups
    }

    /// Accepted announcements in acceptance order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    /// Bonded aggregates still waiting for cosignatures.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    fn validate(&self, transaction: &SignedTransaction) -> Result<(), GatewayError> {
        if transaction.transaction.network != self.config.network {
            return Err(GatewayError::Rejected(format!(
                "Failure_Core_Wrong_Network {}",
                transaction.transaction.network
            )));
        }
        transaction
            .verify()
            .map_err(|e| GatewayError::Rejected(e.to_string()))
    }
}

#[async_trait]
impl LedgerGateway for SimulatedLedger {
    async fn announce(&self, transaction: &SignedTransaction) -> Result<Ack, GatewayError> {
        let mut inner = self.lock();
        inner.take_rejection(SubmissionKind::Transaction)?;
        self.validate(transaction)?;
        if transaction.transaction.is_bonded() {
            return Err(GatewayError::Rejected(
                "Failure_Aggregate_Bonded_Announced_As_Complete".to_string(),
            ));
        }
        inner.check_duplicate(&transaction.hash)?;

        inner.record(SubmissionKind::Transaction, transaction.hash);
        inner.enqueue(transaction.clone());
        debug!(hash = %transaction.hash, "Transaction announced");
        if inner.auto_confirm {
            inner.produce_block();
        }
        Ok(Ack {
            hash: transaction.hash,
        })
    }

    async fn announce_bonded(&self, transaction: &SignedTransaction) -> Result<Ack, GatewayError> {
        let mut inner = self.lock();
        inner.take_rejection(SubmissionKind::Bonded)?;
        self.validate(transaction)?;
        if !transaction.transaction.is_bonded() {
            return Err(GatewayError::Rejected(
                "Failure_Aggregate_Not_Bonded".to_string(),
            ));
        }
        inner.check_duplicate(&transaction.hash)?;
        if inner.state.lock(&transaction.hash).is_none() {
            return Err(GatewayError::Rejected(format!(
                "Failure_LockHash_Unknown_Hash {}",
                transaction.hash
            )));
        }

        inner.record(SubmissionKind::Bonded, transaction.hash);
        let involved = inner.involved(transaction);
        inner.emit_all(
            &involved,
            LedgerEvent::BondedAdded {
                hash: transaction.hash,
            },
        );
        debug!(hash = %transaction.hash, "Bonded aggregate announced");

        if transaction.is_fully_signed() {
            inner.enqueue(transaction.clone());
            if inner.auto_confirm {
                inner.produce_block();
            }
        } else {
            inner.pending.insert(transaction.hash, transaction.clone());
        }
        Ok(Ack {
            hash: transaction.hash,
        })
    }

    async fn announce_cosignature(
        &self,
        cosignature: &CosignatureSigned,
    ) -> Result<Ack, GatewayError> {
        let mut inner = self.lock();
        inner.take_rejection(SubmissionKind::Cosignature)?;
        let parent_hash = cosignature.parent_hash;

        let aggregate = inner.pending.get_mut(&parent_hash).ok_or_else(|| {
            GatewayError::Rejected(format!("Failure_Aggregate_Unknown_Parent {}", parent_hash))
        })?;
        let eligible = aggregate
            .transaction
            .bundle()
            .is_some_and(|b| b.cosigners.iter().any(|c| c.public_key == cosignature.signer));
        if !eligible {
            return Err(GatewayError::Rejected(
                "Failure_Aggregate_Ineligible_Cosignatories".to_string(),
            ));
        }
        aggregate
            .add_cosignature(cosignature)
            .map_err(|e| GatewayError::Rejected(e.to_string()))?;
        let complete = aggregate.is_fully_signed();

        inner.record(SubmissionKind::Cosignature, parent_hash);
        let involved = match inner.pending.get(&parent_hash) {
            Some(aggregate) => inner.involved(aggregate),
            None => Vec::new(),
        };
        inner.emit_all(
            &involved,
            LedgerEvent::CosignatureAdded {
                parent_hash,
                signer: cosignature.signer,
            },
        );
        debug!(parent_hash = %parent_hash, signer = %cosignature.signer, "Cosignature announced");

        if complete {
            if let Some(aggregate) = inner.pending.shift_remove(&parent_hash) {
                inner.enqueue(aggregate);
            }
            if inner.auto_confirm {
                inner.produce_block();
            }
        }
        Ok(Ack { hash: parent_hash })
    }

    async fn get_namespace(&self, path: &NamespacePath) -> Result<NamespaceInfo, GatewayError> {
        let mut inner = self.lock();
        inner.namespace_lookups += 1;
        if inner.faults.namespace_lookups_failing {
            return Err(GatewayError::Transport(
                "simulated namespace lookup outage".to_string(),
            ));
        }
        inner
            .state
            .namespace(path)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("namespace {}", path)))
    }

    async fn get_account_info(&self, address: &Address) -> Result<AccountInfo, GatewayError> {
        self.lock()
            .state
            .account_info(address)
            .ok_or_else(|| GatewayError::NotFound(format!("account {}", address)))
    }

    async fn subscribe(&self, address: &Address) -> Result<Subscription, GatewayError> {
        let (sender, receiver) = mpsc::channel(self.config.event_buffer);
        self.lock()
            .subscribers
            .entry(*address)
            .or_default()
            .push(sender);
        debug!(address = %address, "Address subscription opened");
        Ok(EventStream::new(receiver))
    }

    async fn subscribe_blocks(&self) -> Result<BlockSubscription, GatewayError> {
        let (sender, receiver) = mpsc::channel(self.config.event_buffer);
        self.lock().block_subscribers.push(sender);
        Ok(EventStream::new(receiver))
    }

    async fn pending_bonded_aggregates(
        &self,
        account: &PublicAccount,
    ) -> Result<Vec<SignedTransaction>, GatewayError> {
        let mut inner = self.lock();
        if inner.faults.hidden_pending_polls > 0 {
            inner.faults.hidden_pending_polls -= 1;
            return Ok(Vec::new());
        }
        Ok(inner
            .pending
            .values()
            .filter(|tx| {
                tx.transaction
                    .bundle()
                    .is_some_and(|b| b.cosigners.iter().any(|c| c.public_key == account.public_key))
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizledger_types::{
        AssetAmount, AssetRef, BlockDuration, Deadline, KeyPair, Message, NetworkType, Recipient,
        Transaction,
    };
    use tracing_test::traced_test;

    fn nemesis() -> KeyPair {
        KeyPair::from_seed(&[0xAA; 32])
    }

    fn ledger(auto_confirm: bool) -> SimulatedLedger {
        let config = SimulationConfig::default().with_auto_confirm(auto_confirm);
        SimulatedLedger::new(config, &nemesis().public_account(NetworkType::MijinTest))
    }

    fn transfer(kp: &KeyPair, to: Address, amount: u64) -> SignedTransaction {
        Transaction::single(
            NetworkType::MijinTest,
            Deadline(1),
            kp.public_account(NetworkType::MijinTest),
            Operation::Transfer {
                recipient: Recipient::Address(to),
                assets: vec![AssetAmount::new(
                    AssetRef::parse("cat.currency").unwrap(),
                    Amount(amount),
                )],
                message: Message::Empty,
            },
        )
        .sign(kp)
        .unwrap()
    }

    #[tokio::test]
    async fn test_announce_then_block_confirms_and_notifies() {
        let ledger = ledger(false);
        let nemesis = nemesis();
        let bob = KeyPair::from_seed(&[2; 32]).public_account(NetworkType::MijinTest);
        let mut events = ledger.subscribe(&bob.address).await.unwrap();

        let tx = transfer(&nemesis, bob.address, 500);
        let ack = ledger.announce(&tx).await.unwrap();
        assert_eq!(ack.hash, tx.hash);
        assert_eq!(
            events.recv().await,
            Some(LedgerEvent::UnconfirmedAdded { hash: tx.hash })
        );
        assert!(!ledger.is_confirmed(&tx.hash));

        let block = ledger.produce_block();
        assert_eq!(block.transactions, 1);
        assert_eq!(
            events.recv().await,
            Some(LedgerEvent::Confirmed {
                hash: tx.hash,
                height: block.height
            })
        );
        assert_eq!(ledger.balance(&bob.address, ledger.currency_id()), Amount(500));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_failed_validation_reports_status_error() {
        let ledger = ledger(true);
        let poor = KeyPair::from_seed(&[3; 32]);
        let poor_account = poor.public_account(NetworkType::MijinTest);
        let mut events = ledger.subscribe(&poor_account.address).await.unwrap();

        let tx = transfer(&poor, poor_account.address, 1);
        ledger.announce(&tx).await.unwrap();

        assert_eq!(
            events.recv().await,
            Some(LedgerEvent::UnconfirmedAdded { hash: tx.hash })
        );
        assert_eq!(
            events.recv().await,
            Some(LedgerEvent::StatusError {
                hash: tx.hash,
                status: "Failure_Core_Insufficient_Balance".to_string()
            })
        );
        assert!(logs_contain("Transaction failed validation"));
    }

    #[tokio::test]
    async fn test_rejects_wrong_network_duplicates_and_injected_faults() {
        let ledger = ledger(false);
        let nemesis = nemesis();
        let bob = KeyPair::from_seed(&[2; 32]).public_account(NetworkType::MijinTest);
        let tx = transfer(&nemesis, bob.address, 1);

        ledger.reject_next(SubmissionKind::Transaction, "node busy");
        assert_eq!(
            ledger.announce(&tx).await,
            Err(GatewayError::Rejected("node busy".to_string()))
        );
        ledger.announce(&tx).await.unwrap();
        assert!(matches!(
            ledger.announce(&tx).await,
            Err(GatewayError::Rejected(_))
        ));

        let main_net = Transaction::single(
            NetworkType::MainNet,
            Deadline(1),
            nemesis.public_account(NetworkType::MainNet),
            Operation::RegisterNamespace {
                path: NamespacePath::parse("acme").unwrap(),
                duration: Some(BlockDuration(10)),
            },
        )
        .sign(&nemesis)
        .unwrap();
        assert!(matches!(
            ledger.announce(&main_net).await,
            Err(GatewayError::Rejected(_))
        ));
        assert_eq!(ledger.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_namespace_lookup_outcomes() {
        let ledger = ledger(true);
        let currency = NamespacePath::parse("cat.currency").unwrap();
        assert!(ledger.get_namespace(&currency).await.is_ok());
        assert!(ledger
            .get_namespace(&NamespacePath::parse("acme").unwrap())
            .await
            .unwrap_err()
            .is_not_found());

        ledger.set_namespace_lookups_failing(true);
        assert!(matches!(
            ledger.get_namespace(&currency).await,
            Err(GatewayError::Transport(_))
        ));
        assert_eq!(ledger.namespace_lookups(), 3);
    }

    #[tokio::test]
    async fn test_block_subscription_sees_heights() {
        let ledger = ledger(false);
        let mut blocks = ledger.subscribe_blocks().await.unwrap();
        let first = ledger.produce_block();
        let second = ledger.produce_block();
        assert_eq!(blocks.recv().await, Some(first));
        assert_eq!(blocks.recv().await, Some(second));
        assert_eq!(second.height, first.height.next());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let nemesis = nemesis();
        let bob = KeyPair::from_seed(&[2; 32]).public_account(NetworkType::MijinTest);

        let ledger = ledger(true);
        ledger
            .announce(&transfer(&nemesis, bob.address, 77))
            .await
            .unwrap();
        ledger.save(&path).unwrap();

        let restored = SimulatedLedger::load_or_genesis(
            &path,
            SimulationConfig::default(),
            &nemesis.public_account(NetworkType::MijinTest),
        )
        .unwrap();
        assert_eq!(restored.height(), ledger.height());
        assert_eq!(
            restored.balance(&bob.address, restored.currency_id()),
            Amount(77)
        );
    }
}

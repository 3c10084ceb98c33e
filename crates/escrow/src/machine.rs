//! Escrow state machine.
//!
//! Drives one pull request through hash lock, bonded aggregate and
//! cosignature. The machine is synchronous and performs no I/O: it consumes
//! [`Event`]s and returns [`Action`]s that the runner executes.

use crate::EscrowConfig;
use bizledger_composer::{ComposerError, TransactionComposer};
use bizledger_core::{
    Action, AnnounceStage, EscrowError, EscrowNotification, Event, LedgerEvent, StateMachine,
    TimerId,
};
use bizledger_types::{
    Address, Amount, AssetRef, CosignatureSigned, Deadline, Hash, Identity, KeyPair,
    PublicAccount, SignedTransaction, Transaction, TransactionError,
};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A request for `recipient` to send `amount` of `asset` to `requester`.
///
/// Both identities are held locally: the requester signs the bonded
/// aggregate and the recipient cosigns it.
#[derive(Debug, Clone)]
pub struct EscrowRequest {
    pub requester: Identity,
    pub recipient: Identity,
    pub asset: AssetRef,
    pub amount: Amount,
    /// Deadline shared by the aggregate and its hash lock.
    pub deadline: Deadline,
}

/// Errors preparing the transactions of an escrow flow.
#[derive(Debug, thiserror::Error)]
pub enum EscrowSetupError {
    #[error(transparent)]
    Compose(#[from] ComposerError),

    #[error("Signing failed: {0}")]
    Sign(#[from] TransactionError),
}

/// Where an escrow flow stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowState {
    Created,
    HashLockAnnounced,
    HashLockConfirmed,
    BondedAnnounced,
    Cosigned,
    Complete,
    Failed,
}

impl EscrowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EscrowState::Complete | EscrowState::Failed)
    }
}

impl fmt::Display for EscrowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Escrow protocol for a single pull request.
pub struct EscrowStateMachine {
    config: EscrowConfig,
    state: EscrowState,

    /// Address whose events confirm the hash lock.
    requester: Address,

    /// Signs the cosignature once the aggregate is pending.
    recipient: KeyPair,
    recipient_account: PublicAccount,

    lock: SignedTransaction,
    aggregate: SignedTransaction,

    /// Lock confirmation observed before the announce acknowledgement.
    lock_confirmed_early: bool,

    cosignature_sent: bool,

    now: Duration,
    /// Runner time at which `state` was entered.
    state_entered: Duration,
}

impl EscrowStateMachine {
    /// Compose and sign the bonded aggregate and its hash lock.
    ///
    /// The aggregate carries only the requester's signature. The hash lock
    /// locks `config.collateral` of the network currency on its hash.
    pub fn new(
        config: EscrowConfig,
        composer: &TransactionComposer,
        request: EscrowRequest,
    ) -> Result<Self, EscrowSetupError> {
        let requester = request.requester.public_account();
        let recipient_account = request.recipient.public_account();

        let bundle = composer.compose_pull_request(
            &requester,
            &recipient_account,
            &request.asset,
            request.amount,
        )?;
        let aggregate = Transaction::aggregate(composer.config().network, request.deadline, bundle)
            .sign(&request.requester.keypair)?;
        let lock = composer
            .compose_hash_lock(config.collateral, config.lock_duration, &aggregate)
            .sign(&request.requester.keypair)?;

        debug!(
            aggregate_hash = %aggregate.hash,
            lock_hash = %lock.hash,
            asset = %request.asset,
            amount = %request.amount,
            "Escrow prepared"
        );

        Ok(Self {
            config,
            state: EscrowState::Created,
            requester: requester.address,
            recipient: request.recipient.keypair,
            recipient_account,
            lock,
            aggregate,
            lock_confirmed_early: false,
            cosignature_sent: false,
            now: Duration::ZERO,
            state_entered: Duration::ZERO,
        })
    }

    pub fn state(&self) -> EscrowState {
        self.state
    }

    /// How long the machine has been in its current state.
    pub fn time_in_state(&self) -> Duration {
        self.now.saturating_sub(self.state_entered)
    }

    pub fn lock_hash(&self) -> Hash {
        self.lock.hash
    }

    pub fn aggregate_hash(&self) -> Hash {
        self.aggregate.hash
    }

    pub fn requester(&self) -> Address {
        self.requester
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Transitions
    // ═══════════════════════════════════════════════════════════════════════

    fn on_start(&mut self) -> Vec<Action> {
        if self.state != EscrowState::Created {
            return vec![];
        }
        vec![Action::Subscribe {
            address: self.requester,
        }]
    }

    /// Announce the hash lock only once its confirmation can be observed.
    fn on_subscribed(&mut self) -> Vec<Action> {
        if self.state != EscrowState::Created {
            return vec![];
        }
        vec![
            Action::Announce {
                transaction: self.lock.clone(),
            },
            Action::SetTimer {
                id: TimerId::LockConfirmation,
                duration: self.config.confirmation_timeout,
            },
        ]
    }

    fn on_announced(&mut self, stage: AnnounceStage) -> Vec<Action> {
        match (stage, self.state) {
            (AnnounceStage::HashLock, EscrowState::Created) => {
                self.transition(EscrowState::HashLockAnnounced);
                let mut actions = vec![Action::Notify(EscrowNotification::HashLockAnnounced {
                    lock_hash: self.lock.hash,
                })];
                if self.lock_confirmed_early {
                    actions.extend(self.on_lock_confirmed());
                }
                actions
            }

            (AnnounceStage::Bonded, EscrowState::HashLockConfirmed) => {
                self.transition(EscrowState::BondedAnnounced);
                vec![
                    Action::Notify(EscrowNotification::BondedAnnounced {
                        aggregate_hash: self.aggregate.hash,
                    }),
                    Action::FetchPendingBonded {
                        cosigner: self.recipient_account,
                    },
                ]
            }

            (AnnounceStage::Cosignature, EscrowState::BondedAnnounced) => {
                let aggregate_hash = self.aggregate.hash;
                self.transition(EscrowState::Cosigned);
                let mut actions = vec![
                    Action::CancelTimer {
                        id: TimerId::BondedVisibility,
                    },
                    Action::CancelTimer {
                        id: TimerId::PendingPoll,
                    },
                    Action::Notify(EscrowNotification::Cosigned { aggregate_hash }),
                ];
                self.transition(EscrowState::Complete);
                info!(aggregate_hash = %aggregate_hash, "Escrow completed");
                actions.push(Action::Notify(EscrowNotification::Completed {
                    aggregate_hash,
                }));
                actions
            }

            (stage, state) => {
                warn!(stage = %stage, state = %state, "Unexpected announce acknowledgement");
                vec![]
            }
        }
    }

    fn on_lock_confirmed(&mut self) -> Vec<Action> {
        self.transition(EscrowState::HashLockConfirmed);
        vec![
            Action::CancelTimer {
                id: TimerId::LockConfirmation,
            },
            Action::Notify(EscrowNotification::HashLockConfirmed {
                lock_hash: self.lock.hash,
            }),
            Action::AnnounceBonded {
                transaction: self.aggregate.clone(),
            },
            Action::SetTimer {
                id: TimerId::BondedVisibility,
                duration: self.config.confirmation_timeout,
            },
        ]
    }

    fn on_ledger_event(&mut self, event: LedgerEvent) -> Vec<Action> {
        match event {
            LedgerEvent::Confirmed { hash, height } if hash == self.lock.hash => {
                debug!(lock_hash = %hash, height = height.0, "Hash lock confirmed");
                match self.state {
                    EscrowState::Created => {
                        self.lock_confirmed_early = true;
                        vec![]
                    }
                    EscrowState::HashLockAnnounced => self.on_lock_confirmed(),
                    _ => vec![],
                }
            }

            LedgerEvent::StatusError { hash, status } if hash == self.lock.hash => {
                match self.state {
                    EscrowState::Created | EscrowState::HashLockAnnounced => {
                        self.fail(EscrowError::LockRejected {
                            lock_hash: hash,
                            status,
                        })
                    }
                    _ => vec![],
                }
            }

            LedgerEvent::StatusError { hash, status } if hash == self.aggregate.hash => {
                self.fail(EscrowError::BondedRejected {
                    aggregate_hash: hash,
                    status,
                })
            }

            _ => vec![],
        }
    }

    /// Cosign the aggregate if the recipient can see it and has not signed yet.
    fn on_pending_bonded(&mut self, pending: Vec<SignedTransaction>) -> Vec<Action> {
        if self.state != EscrowState::BondedAnnounced || self.cosignature_sent {
            return vec![];
        }
        let recipient = self.recipient_account.public_key;
        let found = pending
            .iter()
            .find(|tx| tx.hash == self.aggregate.hash && !tx.is_signed_by(&recipient));

        match found {
            Some(aggregate) => {
                self.cosignature_sent = true;
                vec![Action::AnnounceCosignature {
                    cosignature: CosignatureSigned::create(aggregate, &self.recipient),
                }]
            }
            None => {
                debug!(
                    aggregate_hash = %self.aggregate.hash,
                    pending = pending.len(),
                    "Bonded aggregate not visible yet"
                );
                vec![Action::SetTimer {
                    id: TimerId::PendingPoll,
                    duration: self.config.pending_poll_interval,
                }]
            }
        }
    }

    fn on_timer(&mut self, id: TimerId) -> Vec<Action> {
        match (id, self.state) {
            (
                TimerId::LockConfirmation,
                EscrowState::Created | EscrowState::HashLockAnnounced,
            )
            | (
                TimerId::BondedVisibility,
                EscrowState::HashLockConfirmed | EscrowState::BondedAnnounced,
            ) => self.fail(EscrowError::UnresolvedConfirmation { waiting_for: id }),

            (TimerId::PendingPoll, EscrowState::BondedAnnounced) if !self.cosignature_sent => {
                vec![Action::FetchPendingBonded {
                    cosigner: self.recipient_account,
                }]
            }

            _ => vec![],
        }
    }

    fn fail(&mut self, error: EscrowError) -> Vec<Action> {
        warn!(state = %self.state, error = %error, "Escrow failed");
        self.transition(EscrowState::Failed);
        vec![
            Action::CancelTimer {
                id: TimerId::LockConfirmation,
            },
            Action::CancelTimer {
                id: TimerId::BondedVisibility,
            },
            Action::CancelTimer {
                id: TimerId::PendingPoll,
            },
            Action::Notify(EscrowNotification::Failed { error }),
        ]
    }

    fn transition(&mut self, next: EscrowState) {
        debug!(
            from = %self.state,
            to = %next,
            waited_ms = self.time_in_state().as_millis() as u64,
            "Escrow transition"
        );
        self.state = next;
        self.state_entered = self.now;
    }
}

impl StateMachine for EscrowStateMachine {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        if self.state.is_terminal() {
            return vec![];
        }
        match event {
            Event::Start => self.on_start(),
            Event::Subscribed => self.on_subscribed(),
            Event::SubscribeFailed { error } => self.fail(EscrowError::Subscribe(error)),
            Event::Announced { stage, .. } => self.on_announced(stage),
            Event::AnnounceFailed { stage, error } => {
                self.fail(EscrowError::Announce { stage, source: error })
            }
            Event::Ledger(event) => self.on_ledger_event(event),
            Event::PendingBonded(pending) => self.on_pending_bonded(pending),
            Event::PendingFetchFailed { error } => self.fail(EscrowError::FetchPending(error)),
            Event::Timer(id) => self.on_timer(id),
            Event::Cancelled => self.fail(EscrowError::Cancelled),
        }
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    fn now(&self) -> Duration {
        self.now
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

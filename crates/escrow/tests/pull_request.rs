//! Pull request escrow flows over the simulated ledger.

use bizledger_composer::{AssetCreation, ComposerConfig, TransactionComposer};
use bizledger_core::{AnnounceStage, EscrowError, EscrowNotification, GatewayError, LedgerGateway, TimerId};
use bizledger_escrow::{EscrowConfig, EscrowRequest, EscrowRunner, EscrowStateMachine};
use bizledger_planner::{NamespacePlanner, PlannerConfig, PlanningSession};
use bizledger_simulation::{SimulatedLedger, SimulationConfig, SubmissionKind};
use bizledger_test_helpers::{fund, identity, nemesis, simulated_ledger, simulated_ledger_with};
use bizledger_types::{
    Amount, AssetDefinition, AssetNonce, AssetRef, Deadline, Hash, Identity, NamespacePath,
    Transaction,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

struct Fixture {
    ledger: Arc<SimulatedLedger>,
    composer: TransactionComposer,
    alice: Identity,
    bob: Identity,
}

impl Fixture {
    /// Alice holds currency for collateral; Bob owns 1000 `acme.cat`.
    async fn new(ledger: Arc<SimulatedLedger>) -> Self {
        let planner = NamespacePlanner::new(ledger.clone(), PlannerConfig::default());
        let composer = TransactionComposer::new(planner, ComposerConfig::default());
        let alice = identity("acme", "alice", 2);
        let bob = identity("acme", "bob", 3);
        fund(&ledger, &alice, 100);

        let bundle = composer
            .compose_asset_creation(
                &mut PlanningSession::new(),
                &bob.public_account(),
                AssetCreation {
                    name: "acme.cat".into(),
                    definition: AssetDefinition::new(0, false, true),
                    initial_supply: Amount(1000),
                    recipient: None,
                    nonce: AssetNonce(1),
                },
            )
            .await
            .unwrap();
        let signed = Transaction::aggregate(composer.config().network, Deadline(1), bundle)
            .sign(&bob.keypair)
            .unwrap();
        let auto_confirm = ledger.config().auto_confirm;
        ledger.set_auto_confirm(true);
        ledger.announce(&signed).await.unwrap();
        ledger.set_auto_confirm(auto_confirm);
        assert!(ledger.is_confirmed(&signed.hash));

        Self {
            ledger,
            composer,
            alice,
            bob,
        }
    }

    fn runner(
        &self,
        config: EscrowConfig,
    ) -> (EscrowRunner, mpsc::UnboundedReceiver<EscrowNotification>, Hash, Hash) {
        let request = EscrowRequest {
            requester: self.alice.clone(),
            recipient: self.bob.clone(),
            asset: AssetRef::parse("acme.cat").unwrap(),
            amount: Amount(100),
            deadline: Deadline(5_000),
        };
        let timeout = config.confirmation_timeout;
        let machine = EscrowStateMachine::new(config, &self.composer, request).unwrap();
        let lock_hash = machine.lock_hash();
        let aggregate_hash = machine.aggregate_hash();
        let (runner, notifications) = EscrowRunner::new(self.ledger.clone(), machine, timeout);
        (runner, notifications, lock_hash, aggregate_hash)
    }

    fn cat_balance(&self, identity: &Identity) -> Amount {
        let path = NamespacePath::parse("acme.cat").unwrap();
        let asset_id = match self.ledger.namespace(&path).and_then(|n| n.alias) {
            Some(bizledger_core::AliasTarget::Asset(id)) => id,
            other => panic!("acme.cat is not an asset alias: {:?}", other),
        };
        self.ledger.balance(&identity.address(), asset_id)
    }
}

fn drain(mut rx: mpsc::UnboundedReceiver<EscrowNotification>) -> Vec<EscrowNotification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}

#[traced_test]
#[tokio::test]
async fn test_pull_request_completes_and_moves_asset() {
    let fixture = Fixture::new(simulated_ledger(&nemesis())).await;
    let currency = fixture.ledger.currency_id();
    let before = fixture.ledger.balance(&fixture.alice.address(), currency);

    let (runner, rx, lock_hash, aggregate_hash) = fixture.runner(EscrowConfig::default());
    let result = runner.run(CancellationToken::new()).await;

    assert_eq!(result, Ok(aggregate_hash));
    assert_eq!(
        drain(rx),
        vec![
            EscrowNotification::HashLockAnnounced { lock_hash },
            EscrowNotification::HashLockConfirmed { lock_hash },
            EscrowNotification::BondedAnnounced { aggregate_hash },
            EscrowNotification::Cosigned { aggregate_hash },
            EscrowNotification::Completed { aggregate_hash },
        ]
    );

    assert!(fixture.ledger.is_confirmed(&aggregate_hash));
    assert_eq!(fixture.cat_balance(&fixture.bob), Amount(900));
    assert_eq!(fixture.cat_balance(&fixture.alice), Amount(100));
    // Collateral is released once the aggregate confirms.
    assert_eq!(
        fixture.ledger.balance(&fixture.alice.address(), currency),
        before
    );
    assert!(logs_contain("Escrow completed"));
}

#[tokio::test]
async fn test_bonded_announced_only_after_lock_confirmed() {
    let fixture = Fixture::new(simulated_ledger(&nemesis())).await;
    let (runner, _rx, lock_hash, aggregate_hash) = fixture.runner(EscrowConfig::default());
    runner.run(CancellationToken::new()).await.unwrap();

    let submissions = fixture.ledger.submissions();
    let lock = submissions
        .iter()
        .position(|s| s.kind == SubmissionKind::Transaction && s.hash == lock_hash)
        .unwrap();
    let bonded = submissions
        .iter()
        .position(|s| s.kind == SubmissionKind::Bonded && s.hash == aggregate_hash)
        .unwrap();
    let cosigned = submissions
        .iter()
        .position(|s| s.kind == SubmissionKind::Cosignature && s.hash == aggregate_hash)
        .unwrap();
    assert!(lock < bonded && bonded < cosigned);
    assert!(submissions[bonded].height > submissions[lock].height);
}

#[tokio::test]
async fn test_rejected_bonded_announce_fails_without_retry() {
    let fixture = Fixture::new(simulated_ledger(&nemesis())).await;
    fixture
        .ledger
        .reject_next(SubmissionKind::Bonded, "Failure_Aggregate_Too_Many_Transactions");

    let (runner, rx, lock_hash, _) = fixture.runner(EscrowConfig::default());
    let result = runner.run(CancellationToken::new()).await;

    let error = EscrowError::Announce {
        stage: AnnounceStage::Bonded,
        source: GatewayError::Rejected("Failure_Aggregate_Too_Many_Transactions".into()),
    };
    assert_eq!(result, Err(error.clone()));
    assert_eq!(
        drain(rx),
        vec![
            EscrowNotification::HashLockAnnounced { lock_hash },
            EscrowNotification::HashLockConfirmed { lock_hash },
            EscrowNotification::Failed { error },
        ]
    );
    assert_eq!(fixture.ledger.pending_count(), 0);
}

#[tokio::test]
async fn test_unfunded_requester_lock_rejected() {
    let fixture = Fixture::new(simulated_ledger(&nemesis())).await;
    let broke = Fixture {
        alice: identity("acme", "carol", 4),
        ..fixture
    };

    let (runner, rx, lock_hash, _) = broke.runner(EscrowConfig::default());
    let result = runner.run(CancellationToken::new()).await;

    let expected = EscrowError::LockRejected {
        lock_hash,
        status: "Failure_Core_Insufficient_Balance".into(),
    };
    assert_eq!(result, Err(expected.clone()));
    assert_eq!(
        drain(rx).last(),
        Some(&EscrowNotification::Failed { error: expected })
    );
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_lock_times_out() {
    let ledger = simulated_ledger_with(
        SimulationConfig::default().with_auto_confirm(false),
        &nemesis(),
    );
    let fixture = Fixture::new(ledger).await;

    let config = EscrowConfig::default().with_confirmation_timeout(Duration::from_secs(120));
    let (runner, rx, lock_hash, _) = fixture.runner(config);
    let started = tokio::time::Instant::now();
    let result = runner.run(CancellationToken::new()).await;

    let error = EscrowError::UnresolvedConfirmation {
        waiting_for: TimerId::LockConfirmation,
    };
    assert_eq!(result, Err(error.clone()));
    assert!(started.elapsed() >= Duration::from_secs(120));
    assert_eq!(
        drain(rx),
        vec![
            EscrowNotification::HashLockAnnounced { lock_hash },
            EscrowNotification::Failed { error },
        ]
    );
    assert_eq!(fixture.ledger.submissions().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_repolls_until_bonded_visible() {
    let fixture = Fixture::new(simulated_ledger(&nemesis())).await;
    fixture.ledger.hide_pending_bonded(3);

    let config = EscrowConfig::default().with_pending_poll_interval(Duration::from_secs(2));
    let (runner, _rx, _, aggregate_hash) = fixture.runner(config);
    let started = tokio::time::Instant::now();
    let result = runner.run(CancellationToken::new()).await;

    assert_eq!(result, Ok(aggregate_hash));
    assert!(started.elapsed() >= Duration::from_secs(6));
}

#[tokio::test]
async fn test_cancellation_fails_flow() {
    let ledger = simulated_ledger_with(
        SimulationConfig::default().with_auto_confirm(false),
        &nemesis(),
    );
    let fixture = Fixture::new(ledger).await;
    let (runner, mut rx, lock_hash, _) = fixture.runner(EscrowConfig::default());
    let cancel = CancellationToken::new();

    let trigger = async {
        let first = rx.recv().await;
        assert_eq!(first, Some(EscrowNotification::HashLockAnnounced { lock_hash }));
        cancel.cancel();
    };
    let (result, ()) = tokio::join!(runner.run(cancel.clone()), trigger);

    assert_eq!(result, Err(EscrowError::Cancelled));
    assert_eq!(
        rx.recv().await,
        Some(EscrowNotification::Failed {
            error: EscrowError::Cancelled
        })
    );
}

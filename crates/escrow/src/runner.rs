//! Async runner for the escrow state machine.

use crate::EscrowStateMachine;
use bizledger_core::{
    Ack, Action, AnnounceStage, EscrowError, EscrowNotification, Event, GatewayError, LedgerEvent,
    LedgerGateway, StateMachine, Subscription, TimerId,
};
use bizledger_types::Hash;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Executes an [`EscrowStateMachine`] against a ledger.
///
/// Action results, timer expiries and subscription events are fed back into
/// the machine one at a time until it reaches a terminal state.
/// Notifications are forwarded to the receiver returned by [`EscrowRunner::new`].
pub struct EscrowRunner {
    gateway: Arc<dyn LedgerGateway>,
    machine: EscrowStateMachine,

    /// Bound on each gateway request.
    request_timeout: Duration,

    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    notifications: mpsc::UnboundedSender<EscrowNotification>,

    subscription: Option<Subscription>,
    timers: HashMap<TimerId, JoinHandle<()>>,
    started: Instant,
    outcome: Option<Result<Hash, EscrowError>>,
}

impl EscrowRunner {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        machine: EscrowStateMachine,
        request_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<EscrowNotification>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notifications, notifications_rx) = mpsc::unbounded_channel();
        let runner = Self {
            gateway,
            machine,
            request_timeout,
            events_tx,
            events_rx,
            notifications,
            subscription: None,
            timers: HashMap::new(),
            started: Instant::now(),
            outcome: None,
        };
        (runner, notifications_rx)
    }

    /// Run the flow to completion.
    ///
    /// Returns the aggregate hash once the recipient's cosignature was
    /// accepted. Firing `cancel` fails the flow with
    /// [`EscrowError::Cancelled`].
    pub async fn run(mut self, cancel: CancellationToken) -> Result<Hash, EscrowError> {
        self.started = Instant::now();
        info!(
            aggregate_hash = %self.machine.aggregate_hash(),
            lock_hash = %self.machine.lock_hash(),
            "Starting escrow"
        );
        self.dispatch(Event::Start).await;

        while !self.machine.is_terminal() {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Some(Event::Cancelled),
                Some(event) = self.events_rx.recv() => Some(event),
                ledger = next_ledger_event(&mut self.subscription) => ledger.map(Event::Ledger),
            };
            match next {
                Some(event) => self.dispatch(event).await,
                None => {
                    warn!("Ledger subscription closed");
                    self.subscription = None;
                }
            }
        }

        self.shutdown();
        self.outcome.unwrap_or(Err(EscrowError::Cancelled))
    }

    async fn dispatch(&mut self, event: Event) {
        self.machine.set_time(self.started.elapsed());
        debug!(
            event = event.type_name(),
            state = %self.machine.state(),
            "Escrow event"
        );
        for action in self.machine.handle(event) {
            self.execute(action).await;
        }
    }

    async fn execute(&mut self, action: Action) {
        debug!(action = action.type_name(), "Escrow action");
        let event = match action {
            Action::Subscribe { address } => {
                let result = self.request(self.gateway.subscribe(&address)).await;
                match result {
                    Ok(subscription) => {
                        self.subscription = Some(subscription);
                        Event::Subscribed
                    }
                    Err(error) => Event::SubscribeFailed { error },
                }
            }

            Action::Announce { transaction } => {
                let result = self.request(self.gateway.announce(&transaction)).await;
                announced(AnnounceStage::HashLock, result)
            }

            Action::AnnounceBonded { transaction } => {
                let result = self.request(self.gateway.announce_bonded(&transaction)).await;
                announced(AnnounceStage::Bonded, result)
            }

            Action::AnnounceCosignature { cosignature } => {
                let result = self
                    .request(self.gateway.announce_cosignature(&cosignature))
                    .await;
                announced(AnnounceStage::Cosignature, result)
            }

            Action::FetchPendingBonded { cosigner } => {
                let result = self
                    .request(self.gateway.pending_bonded_aggregates(&cosigner))
                    .await;
                match result {
                    Ok(pending) => Event::PendingBonded(pending),
                    Err(error) => Event::PendingFetchFailed { error },
                }
            }

            Action::SetTimer { id, duration } => {
                self.set_timer(id, duration);
                return;
            }

            Action::CancelTimer { id } => {
                if let Some(handle) = self.timers.remove(&id) {
                    handle.abort();
                }
                return;
            }

            Action::Notify(notification) => {
                self.notify(notification);
                return;
            }
        };
        // The receiver lives in `self`, so the send cannot fail.
        let _ = self.events_tx.send(event);
    }

    async fn request<T>(
        &self,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Transport(format!(
                "request timed out after {:?}",
                self.request_timeout
            ))),
        }
    }

    fn set_timer(&mut self, id: TimerId, duration: Duration) {
        let events = self.events_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = events.send(Event::Timer(id));
        });
        if let Some(previous) = self.timers.insert(id, handle) {
            previous.abort();
        }
    }

    fn notify(&mut self, notification: EscrowNotification) {
        match &notification {
            EscrowNotification::Completed { aggregate_hash } => {
                self.outcome = Some(Ok(*aggregate_hash));
            }
            EscrowNotification::Failed { error } => {
                self.outcome = Some(Err(error.clone()));
            }
            _ => {}
        }
        info!(notification = ?notification, "Escrow progress");
        if self.notifications.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }

    fn shutdown(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
    }
}

fn announced(stage: AnnounceStage, result: Result<Ack, GatewayError>) -> Event {
    match result {
        Ok(ack) => Event::Announced { stage, ack },
        Err(error) => Event::AnnounceFailed { stage, error },
    }
}

async fn next_ledger_event(subscription: &mut Option<Subscription>) -> Option<LedgerEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

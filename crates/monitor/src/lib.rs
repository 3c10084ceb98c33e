//! Background monitors that log ledger activity.
//!
//! Each monitor runs as its own tokio task, owns its subscription, and stops
//! when its [`CancellationToken`] fires or the subscription closes. Monitors
//! share no mutable state.

use bizledger_core::{GatewayError, LedgerEvent, LedgerGateway};
use bizledger_types::Address;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A set of running monitors sharing one cancellation token.
#[derive(Debug)]
pub struct Monitors {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Monitors {
    /// Start no monitors.
    pub fn disabled() -> Self {
        Self {
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Start the block monitor and one address monitor per address.
    pub async fn start(
        gateway: Arc<dyn LedgerGateway>,
        addresses: &[Address],
    ) -> Result<Self, GatewayError> {
        let cancel = CancellationToken::new();
        let block = spawn_block_monitor(gateway.clone(), cancel.child_token()).await?;
        let mut monitors = Self {
            cancel,
            handles: vec![block],
        };
        for address in addresses {
            match spawn_address_monitor(gateway.clone(), *address, monitors.cancel.child_token())
                .await
            {
                Ok(handle) => monitors.handles.push(handle),
                Err(e) => {
                    warn!(address = %address, error = %e, "Address monitor failed to start");
                    monitors.shutdown().await;
                    return Err(e);
                }
            }
        }
        Ok(monitors)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop every monitor and wait for them to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Monitor task ended abnormally");
            }
        }
    }
}

/// Log every new block height until cancelled.
pub async fn spawn_block_monitor(
    gateway: Arc<dyn LedgerGateway>,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, GatewayError> {
    let mut blocks = gateway.subscribe_blocks().await?;
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                block = blocks.recv() => match block {
                    Some(block) => info!(
                        height = block.height.0,
                        hash = %block.hash,
                        transactions = block.transactions,
                        "New block"
                    ),
                    None => {
                        warn!("Block subscription closed");
                        break;
                    }
                },
            }
        }
        blocks.close();
        debug!("Block monitor stopped");
    }))
}

/// Log activity on `address` until cancelled.
pub async fn spawn_address_monitor(
    gateway: Arc<dyn LedgerGateway>,
    address: Address,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, GatewayError> {
    let mut events = gateway.subscribe(&address).await?;
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => log_event(&address, &event),
                    None => {
                        warn!(address = %address, "Address subscription closed");
                        break;
                    }
                },
            }
        }
        events.close();
        debug!(address = %address, "Address monitor stopped");
    }))
}

fn log_event(address: &Address, event: &LedgerEvent) {
    match event {
        LedgerEvent::Confirmed { hash, height } => {
            info!(address = %address, hash = %hash, height = height.0, "Transaction confirmed")
        }
        LedgerEvent::UnconfirmedAdded { hash } => {
            info!(address = %address, hash = %hash, "Transaction unconfirmed")
        }
        LedgerEvent::StatusError { hash, status } => {
            warn!(address = %address, hash = %hash, status = %status, "Transaction failed")
        }
        LedgerEvent::CosignatureAdded {
            parent_hash,
            signer,
        } => info!(
            address = %address,
            parent_hash = %parent_hash,
            signer = %signer,
            "Cosignature added"
        ),
        LedgerEvent::BondedAdded { hash } => {
            info!(address = %address, hash = %hash, "Bonded aggregate added")
        }
    }
}

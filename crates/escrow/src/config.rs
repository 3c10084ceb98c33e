//! Escrow configuration.

use bizledger_types::{Amount, BlockDuration};
use std::time::Duration;

/// Configuration for an escrow flow.
#[derive(Debug, Clone)]
pub struct EscrowConfig {
    /// Currency locked, in absolute units, until the bonded aggregate resolves.
    pub collateral: Amount,

    /// Blocks the hash lock stays valid.
    pub lock_duration: BlockDuration,

    /// Upper bound on every wait: lock confirmation, the bonded aggregate
    /// becoming visible, and each gateway request.
    pub confirmation_timeout: Duration,

    /// Delay between pending-bonded lookups while the aggregate is not yet
    /// visible to the recipient.
    pub pending_poll_interval: Duration,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            collateral: Amount(10_000_000),
            lock_duration: BlockDuration(100),
            confirmation_timeout: Duration::from_secs(120),
            pending_poll_interval: Duration::from_secs(2),
        }
    }
}

impl EscrowConfig {
    pub fn with_collateral(mut self, collateral: Amount) -> Self {
        self.collateral = collateral;
        self
    }

    pub fn with_lock_duration(mut self, duration: BlockDuration) -> Self {
        self.lock_duration = duration;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_pending_poll_interval(mut self, interval: Duration) -> Self {
        self.pending_poll_interval = interval;
        self
    }
}

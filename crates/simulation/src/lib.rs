//! In-process ledger for tests and offline use.
//!
//! [`SimulatedLedger`] implements [`LedgerGateway`](bizledger_core::LedgerGateway)
//! against deterministic in-memory state. Announcements queue up and are
//! applied when a block is produced, either immediately (auto-confirm) or on
//! demand, so tests can observe every intermediate ledger event.
//!
//! ```text
//!   announce ──► pool ──► produce_block ──► LedgerState::apply
//!                  ▲                               │
//!   announce_bonded│                               ├─► Confirmed
//!       │          │ fully signed                  └─► StatusError
//!       ▼          │
//!    pending ◄── announce_cosignature
//! ```

mod config;
mod ledger;
mod state;

pub use config::SimulationConfig;
pub use ledger::{LedgerSnapshot, SimulatedLedger, SimulationError, Submission, SubmissionKind};
pub use state::{AssetRecord, HashLockRecord, LedgerState, Rejection};

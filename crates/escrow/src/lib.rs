//! Escrow protocol for pull requests.
//!
//! A pull request asks a recipient to transfer an asset to the requester.
//! The requester locks collateral on the hash of a bonded aggregate, announces
//! the aggregate once the lock is confirmed, and the recipient cosigns it.
//!
//! ```text
//! Created ─► HashLockAnnounced ─► HashLockConfirmed ─► BondedAnnounced ─► Cosigned ─► Complete
//!    └──────────────┴────────────────────┴─────────────────────┴──► Failed
//! ```
//!
//! [`EscrowStateMachine`] holds the protocol logic and [`EscrowRunner`]
//! executes it against a [`LedgerGateway`](bizledger_core::LedgerGateway).

mod config;
mod machine;
mod runner;

pub use config::EscrowConfig;
pub use machine::{EscrowRequest, EscrowSetupError, EscrowState, EscrowStateMachine};
pub use runner::EscrowRunner;

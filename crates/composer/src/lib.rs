//! Transaction composition.
//!
//! [`TransactionComposer`] turns provisioning intents (create an asset, an
//! identity, a scope, a namespace, a pull request) into ordered
//! [`AggregateBundle`](bizledger_types::AggregateBundle)s. It never writes to
//! the ledger; existence checks are delegated to the namespace planner.

mod composer;
mod config;

pub use composer::{AssetCreation, ComposerError, PullRequestNote, TransactionComposer};
pub use config::ComposerConfig;

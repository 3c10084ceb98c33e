//! The `bizledger` command-line tool.
//!
//! | command | effect |
//! |---|---|
//! | `scope create -s acme` | owner identity, funding from nemesis, `acme.identities` and `acme.names` |
//! | `scope show -s acme` | owner and members with their aliases |
//! | `identity create -s acme -n alice` | key, `acme.identities.alice`, badge `acme.names.alice` |
//! | `identity list` / `identity remove` | local identity file |
//! | `asset create -i acme.alice -n acme.cat -q 1000` | namespaces, definition, supply, alias, transfer |
//! | `namespace create -i acme.alice -n acme.widgets` | missing namespace segments |
//! | `pull-request create -i acme.alice -n acme.cat -a 10` | hash lock, bonded aggregate, cosignature |
//! | `network import -p ./bootstrap` | `default.nemesis` from a bootstrap installation |
//!
//! `--simulate` runs every command against an in-process ledger persisted
//! next to the identity file.

pub mod commands;
pub mod config;
mod context;

pub use commands::Command;
pub use config::CliConfig;
pub use context::Context;

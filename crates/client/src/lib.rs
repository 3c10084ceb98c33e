//! HTTP client for ledger nodes.
//!
//! [`HttpGateway`] implements [`LedgerGateway`](bizledger_core::LedgerGateway)
//! against a node's JSON REST API:
//!
//! | operation | endpoint |
//! |---|---|
//! | announce | `PUT /transactions` |
//! | announce bonded | `PUT /transactions/partial` |
//! | announce cosignature | `PUT /transactions/cosignature` |
//! | namespace | `GET /namespaces/{path}` |
//! | account | `GET /accounts/{address}` |
//! | pending bonded | `GET /accounts/{public_key}/transactions/partial` |
//! | address events | `GET /accounts/{address}/events?from={cursor}` (polled) |
//! | blocks | `GET /chain/height`, `GET /blocks/{height}` (polled) |

mod config;
mod gateway;
mod types;

pub use config::ClientConfig;
pub use gateway::HttpGateway;

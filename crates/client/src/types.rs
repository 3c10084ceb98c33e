//! Wire types for the node REST API.

use bizledger_core::LedgerEvent;
use bizledger_types::{BlockHeight, CosignatureSigned, Hash, SignedTransaction};
use serde::{Deserialize, Serialize};

/// Body of `PUT /transactions` and `PUT /transactions/partial`.
#[derive(Debug, Serialize)]
pub struct AnnounceRequest<'a> {
    pub transaction: &'a SignedTransaction,
}

/// Body of `PUT /transactions/cosignature`.
#[derive(Debug, Serialize)]
pub struct CosignatureRequest<'a> {
    pub cosignature: &'a CosignatureSigned,
}

/// Response to any announcement.
#[derive(Debug, Deserialize)]
pub struct AnnounceResponse {
    pub hash: Hash,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from `GET /chain/height`.
#[derive(Debug, Deserialize)]
pub struct ChainHeightResponse {
    pub height: BlockHeight,
}

/// Response from `GET /accounts/{address}/events?from={cursor}`.
#[derive(Debug, Deserialize)]
pub struct AccountEventsResponse {
    pub events: Vec<LedgerEvent>,
    /// Cursor to pass on the next poll.
    pub next: u64,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorResponse {
    /// Best-effort description, falling back to the raw body.
    pub fn describe(body: &str) -> String {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(e) if !e.code.is_empty() && !e.message.is_empty() => {
                format!("{}: {}", e.code, e.message)
            }
            Ok(e) if !e.code.is_empty() => e.code,
            Ok(e) if !e.message.is_empty() => e.message,
            _ => body.trim().to_string(),
        }
    }
}

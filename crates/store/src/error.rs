//! Store errors.

use bizledger_types::HexError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Identity {slug} not found")]
    IdentityNotFound { slug: String },

    #[error("Failed to access identity file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Identity file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored key of {slug} is invalid: {source}")]
    InvalidKey {
        slug: String,
        #[source]
        source: HexError,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::IdentityNotFound { .. })
    }
}

//! Domain-separated signing messages.
//!
//! Every signature produced by an identity covers a message built from a
//! domain tag followed by the content being signed. Domain separation keeps a
//! cosignature from ever being replayed as a transaction signature.
//!
//! | Tag | Purpose |
//! |-----|---------|
//! | `TRANSACTION` | Transaction hash computation and issuer signature |
//! | `COSIGNATURE` | Cosignature over a bonded aggregate's hash |

use crate::Hash;

/// Domain tag for transaction hashing and signing.
///
/// Hash format: `TRANSACTION` || canonical transaction bytes
/// Signature format: `TRANSACTION` || transaction_hash
pub const DOMAIN_TRANSACTION: &[u8] = b"TRANSACTION";

/// Domain tag for aggregate cosignatures.
///
/// Format: `COSIGNATURE` || parent_hash
pub const DOMAIN_COSIGNATURE: &[u8] = b"COSIGNATURE";

/// Build the message an issuer (and, for complete aggregates, every
/// cosigner) signs for a transaction.
pub fn transaction_message(transaction_hash: &Hash) -> Vec<u8> {
    let mut message = Vec::with_capacity(DOMAIN_TRANSACTION.len() + Hash::BYTES);
    message.extend_from_slice(DOMAIN_TRANSACTION);
    message.extend_from_slice(transaction_hash.as_bytes());
    message
}

/// Build the message a cosigner signs when joining a bonded aggregate.
pub fn cosignature_message(parent_hash: &Hash) -> Vec<u8> {
    let mut message = Vec::with_capacity(DOMAIN_COSIGNATURE.len() + Hash::BYTES);
    message.extend_from_slice(DOMAIN_COSIGNATURE);
    message.extend_from_slice(parent_hash.as_bytes());
    message
}

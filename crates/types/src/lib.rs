//! Core types for bizledger.
//!
//! Identifiers, hashes, keys, amounts, namespace paths, ledger operations and
//! the aggregate bundles that carry them. Everything here is plain data with
//! no I/O; the planner, composer and escrow crates build on these types.

mod amount;
mod asset;
mod crypto;
mod hash;
mod identifiers;
mod identity;
mod namespace;
mod operation;
mod reference;
pub mod signing;
mod transaction;

pub use amount::{Amount, AmountError, AssetAmount, AssetAmountError};
pub use asset::{AssetDefinition, AssetError};
pub use crypto::{KeyPair, PublicAccount, PublicKey, Signature};
pub use hash::{Hash, HexError};
pub use identifiers::{
    Address, AddressError, AssetId, AssetNonce, BlockDuration, BlockHeight, Deadline, NamespaceId,
    NetworkType, UnknownNetwork,
};
pub use identity::{
    clean_identity_name, clean_name, slug, Identity, Scope, DEFAULT_NAME, IDENTITIES_SEGMENT,
    NAMES_SEGMENT, NEMESIS_NAME, NEMESIS_SCOPE, OWNER_NAME,
};
pub use namespace::{NamespaceError, NamespacePath};
pub use operation::{Message, Operation, OperationKind, SupplyDirection};
pub use reference::{AssetRef, Recipient, Reference, ReferenceError};
pub use transaction::{
    AggregateBundle, BundleKind, Cosignature, CosignatureSigned, InnerOperation,
    SignedTransaction, Transaction, TransactionBody, TransactionError,
};

/// Serde adapter rendering fixed-size byte arrays as uppercase hex strings.
pub(crate) mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode_upper(bytes))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let mut bytes = [0u8; N];
        hex::decode_to_slice(text.as_str(), &mut bytes).map_err(D::Error::custom)?;
        Ok(bytes)
    }
}

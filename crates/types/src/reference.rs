//! Parsing of user-supplied references to addresses, namespaces and assets.
//!
//! A single textual reference can name three different things depending on
//! its shape. [`Reference::parse`] classifies it once and callers narrow the
//! result with [`Reference::into_asset`] or [`Reference::into_recipient`].

use crate::{Address, AssetId, NamespaceError, NamespacePath};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A classified reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// A rendered account address (`S...`, 41 characters, dashes ignored).
    Address(Address),
    /// A namespace name that is, or will be, aliased to an address or asset.
    Namespace(NamespacePath),
    /// A raw asset id (decimal, or exactly 16 hex digits).
    Asset(AssetId),
}

impl Reference {
    /// Classify `input`.
    ///
    /// Order of precedence: address, decimal asset id, 16-digit hex asset id,
    /// namespace name.
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ReferenceError::InvalidReference {
                input: input.to_string(),
                source: None,
            });
        }

        let undashed: String = trimmed.chars().filter(|c| *c != '-').collect();
        if undashed.len() == Address::RENDERED_LEN {
            if let Ok(address) = Address::parse(&undashed) {
                return Ok(Reference::Address(address));
            }
        }

        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return trimmed
                .parse::<u64>()
                .map(|id| Reference::Asset(AssetId(id)))
                .map_err(|_| ReferenceError::InvalidReference {
                    input: input.to_string(),
                    source: None,
                });
        }

        if let Some(id) = AssetId::from_hex(trimmed) {
            return Ok(Reference::Asset(id));
        }

        NamespacePath::parse(trimmed)
            .map(Reference::Namespace)
            .map_err(|e| ReferenceError::InvalidReference {
                input: input.to_string(),
                source: Some(e),
            })
    }

    /// Narrow to something an asset amount can name.
    pub fn into_asset(self) -> Result<AssetRef, ReferenceError> {
        match self {
            Reference::Asset(id) => Ok(AssetRef::Id(id)),
            Reference::Namespace(path) => Ok(AssetRef::Alias(path)),
            Reference::Address(address) => Err(ReferenceError::NotAnAsset(address.plain())),
        }
    }

    /// Narrow to something funds can be sent to.
    pub fn into_recipient(self) -> Result<Recipient, ReferenceError> {
        match self {
            Reference::Address(address) => Ok(Recipient::Address(address)),
            Reference::Namespace(path) => Ok(Recipient::Alias(path)),
            Reference::Asset(id) => Err(ReferenceError::NotARecipient(id.to_hex())),
        }
    }
}

/// An asset named by id or by namespace alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRef {
    Id(AssetId),
    Alias(NamespacePath),
}

impl AssetRef {
    /// Parse an asset reference (`"cat.currency"`, `"0123456789ABCDEF"`, `"42"`).
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        Reference::parse(input)?.into_asset()
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Id(id) => write!(f, "{}", id),
            AssetRef::Alias(path) => write!(f, "{}", path),
        }
    }
}

/// A transfer destination named by address or by namespace alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Address(Address),
    Alias(NamespacePath),
}

impl Recipient {
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        Reference::parse(input)?.into_recipient()
    }
}

impl From<Address> for Recipient {
    fn from(address: Address) -> Self {
        Recipient::Address(address)
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Address(address) => write!(f, "{}", address),
            Recipient::Alias(path) => write!(f, "@{}", path),
        }
    }
}

/// Reference classification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("Invalid reference {input:?}")]
    InvalidReference {
        input: String,
        #[source]
        source: Option<NamespaceError>,
    },

    #[error("{0} is an address, expected an asset")]
    NotAnAsset(String),

    #[error("{0} is an asset id, expected an address or namespace")]
    NotARecipient(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyPair, NetworkType};

    #[test]
    fn test_classifies_address() {
        let address = KeyPair::from_seed(&[4u8; 32])
            .public_account(NetworkType::MijinTest)
            .address;
        assert_eq!(
            Reference::parse(&address.plain()).unwrap(),
            Reference::Address(address)
        );

        let rendered = address.plain();
        let dashed = format!("{}-{}", &rendered[..6], &rendered[6..]);
        assert_eq!(
            Reference::parse(&dashed).unwrap(),
            Reference::Address(address)
        );
    }

    #[test]
    fn test_classifies_asset_ids() {
        assert_eq!(
            Reference::parse("42").unwrap(),
            Reference::Asset(AssetId(42))
        );
        assert_eq!(
            Reference::parse("00000000000000FF").unwrap(),
            Reference::Asset(AssetId(255))
        );
    }

    #[test]
    fn test_classifies_namespace() {
        assert_eq!(
            Reference::parse("acme.cat").unwrap(),
            Reference::Namespace(NamespacePath::parse("acme.cat").unwrap())
        );
        assert!(Reference::parse("a.b.c.d").is_err());
        assert!(Reference::parse("").is_err());
    }

    #[test]
    fn test_narrowing() {
        let address = KeyPair::from_seed(&[4u8; 32])
            .public_account(NetworkType::MijinTest)
            .address;
        assert!(matches!(
            Reference::Address(address).into_asset(),
            Err(ReferenceError::NotAnAsset(_))
        ));
        assert!(matches!(
            Reference::Asset(AssetId(1)).into_recipient(),
            Err(ReferenceError::NotARecipient(_))
        ));
        assert_eq!(
            Recipient::parse("acme.identities.bob").unwrap(),
            Recipient::Alias(NamespacePath::parse("acme.identities.bob").unwrap())
        );
    }
}

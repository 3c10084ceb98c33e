//! Identities, scopes and the namespace conventions that tie them together.
//!
//! An identity `alice` in scope `acme` is known on the ledger by two aliases:
//!
//! - `acme.identities.alice` points at its address,
//! - `acme.names.alice` points at a single non-transferable badge asset it
//!   holds.

use crate::{Address, KeyPair, NamespaceError, NamespacePath, NetworkType, PublicAccount};
use std::fmt;

/// Name of the identity that owns a scope.
pub const OWNER_NAME: &str = "owner";

/// Name used when an identity name cleans to nothing.
pub const DEFAULT_NAME: &str = "default";

/// Scope and name under which a network's nemesis key is stored.
pub const NEMESIS_SCOPE: &str = "default";
pub const NEMESIS_NAME: &str = "nemesis";

/// Second-level segment holding address aliases.
pub const IDENTITIES_SEGMENT: &str = "identities";

/// Second-level segment holding badge asset aliases.
pub const NAMES_SEGMENT: &str = "names";

/// A key pair bound to a network, a peer and a `scope.name` slug.
#[derive(Clone)]
pub struct Identity {
    pub keypair: KeyPair,
    pub network: NetworkType,
    /// Node url this identity talks to.
    pub url: String,
    pub scope: String,
    pub name: String,
}

impl Identity {
    pub fn new(
        keypair: KeyPair,
        network: NetworkType,
        url: impl Into<String>,
        scope: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            keypair,
            network,
            url: url.into(),
            scope: scope.into(),
            name: name.into(),
        }
    }

    /// `scope.name`
    pub fn slug(&self) -> String {
        slug(&self.scope, &self.name)
    }

    pub fn public_account(&self) -> PublicAccount {
        self.keypair.public_account(self.network)
    }

    pub fn address(&self) -> Address {
        self.public_account().address
    }

    pub fn is_owner(&self) -> bool {
        self.name == OWNER_NAME
    }

    /// `scope.identities.name`, aliased to this identity's address.
    pub fn address_alias(&self) -> Result<NamespacePath, NamespaceError> {
        NamespacePath::from_segments([self.scope.as_str(), IDENTITIES_SEGMENT, self.name.as_str()])
    }

    /// `scope.names.name`, aliased to this identity's badge asset.
    pub fn asset_alias(&self) -> Result<NamespacePath, NamespaceError> {
        NamespacePath::from_segments([self.scope.as_str(), NAMES_SEGMENT, self.name.as_str()])
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("slug", &self.slug())
            .field("network", &self.network)
            .field("url", &self.url)
            .field("address", &self.address())
            .finish()
    }
}

/// Identities grouped under one scope name.
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub identities: Vec<Identity>,
}

impl Scope {
    /// The identity named [`OWNER_NAME`], if the scope has one.
    pub fn owner(&self) -> Option<&Identity> {
        self.identities.iter().find(|i| i.is_owner())
    }

    /// Members other than the owner.
    pub fn members(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter().filter(|i| !i.is_owner())
    }

    /// `scope.identities`
    pub fn identities_path(&self) -> Result<NamespacePath, NamespaceError> {
        NamespacePath::from_segments([self.name.as_str(), IDENTITIES_SEGMENT])
    }

    /// `scope.names`
    pub fn names_path(&self) -> Result<NamespacePath, NamespaceError> {
        NamespacePath::from_segments([self.name.as_str(), NAMES_SEGMENT])
    }
}

/// `scope.name`
pub fn slug(scope: &str, name: &str) -> String {
    format!("{}.{}", scope, name)
}

/// Strip characters outside `[A-Za-z0-9_-]`.
pub fn clean_name(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Clean an identity name, falling back to [`DEFAULT_NAME`] when nothing is left.
pub fn clean_identity_name(input: &str) -> String {
    let cleaned = clean_name(input);
    if cleaned.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        cleaned
    }
}

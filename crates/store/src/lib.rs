//! Identity storage.
//!
//! Identities are keyed by their slug (`scope.name`). [`JsonIdentityStore`]
//! persists them to a JSON file, [`MemoryIdentityStore`] keeps them in
//! process for tests and simulated runs.

mod error;
mod json;
mod memory;

pub use error::StoreError;
pub use json::JsonIdentityStore;
pub use memory::MemoryIdentityStore;

use bizledger_types::{slug, Identity, KeyPair, NetworkType, Scope};

/// Wildcard scope matching every identity.
pub const ANY_SCOPE: &str = "*";

/// Which identities [`IdentityStore::list`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityFilter {
    All,
    Scope(String),
    Exact { scope: String, name: String },
}

impl IdentityFilter {
    /// Build a filter from optional scope and name arguments.
    ///
    /// A missing or `*` scope matches everything; a name narrows a scope to
    /// one identity.
    pub fn new(scope: Option<&str>, name: Option<&str>) -> Self {
        match (scope, name) {
            (None, _) => IdentityFilter::All,
            (Some(scope), _) if scope == ANY_SCOPE => IdentityFilter::All,
            (Some(scope), None) => IdentityFilter::Scope(scope.to_string()),
            (Some(scope), Some(name)) => IdentityFilter::Exact {
                scope: scope.to_string(),
                name: name.to_string(),
            },
        }
    }

    pub fn matches(&self, identity: &Identity) -> bool {
        match self {
            IdentityFilter::All => true,
            IdentityFilter::Scope(scope) => identity.scope == *scope,
            IdentityFilter::Exact { scope, name } => {
                identity.scope == *scope && identity.name == *name
            }
        }
    }
}

/// Persistence for identities.
pub trait IdentityStore: Send + Sync {
    /// Look up `scope.name`.
    fn find(&self, scope: &str, name: &str) -> Result<Identity, StoreError>;

    /// Store an identity, replacing any identity with the same slug.
    fn save(
        &self,
        keypair: KeyPair,
        network: NetworkType,
        url: &str,
        scope: &str,
        name: &str,
    ) -> Result<Identity, StoreError>;

    /// Identities matching `filter`, ordered by slug.
    fn list(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, StoreError>;

    /// Remove the identity stored under `slug`.
    fn remove(&self, slug: &str) -> Result<Identity, StoreError>;

    /// Every identity of `scope`. The scope may be empty.
    fn find_scope(&self, scope: &str) -> Result<Scope, StoreError> {
        Ok(Scope {
            name: scope.to_string(),
            identities: self.list(&IdentityFilter::Scope(scope.to_string()))?,
        })
    }

    /// Whether `scope.name` exists.
    fn contains(&self, scope: &str, name: &str) -> Result<bool, StoreError> {
        match self.find(scope, name) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn not_found(scope: &str, name: &str) -> StoreError {
    StoreError::IdentityNotFound {
        slug: slug(scope, name),
    }
}

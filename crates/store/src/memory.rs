//! In-memory identity store.

use crate::{not_found, IdentityFilter, IdentityStore, StoreError};
use bizledger_types::{Identity, KeyPair, NetworkType};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Identities held in process memory, keyed by slug.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identities: RwLock<BTreeMap<String, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `identities`.
    pub fn with_identities(identities: impl IntoIterator<Item = Identity>) -> Self {
        let store = Self::new();
        {
            let mut map = store.identities.write();
            for identity in identities {
                map.insert(identity.slug(), identity);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.read().is_empty()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn find(&self, scope: &str, name: &str) -> Result<Identity, StoreError> {
        self.identities
            .read()
            .get(&bizledger_types::slug(scope, name))
            .cloned()
            .ok_or_else(|| not_found(scope, name))
    }

    fn save(
        &self,
        keypair: KeyPair,
        network: NetworkType,
        url: &str,
        scope: &str,
        name: &str,
    ) -> Result<Identity, StoreError> {
        let identity = Identity::new(keypair, network, url, scope, name);
        self.identities
            .write()
            .insert(identity.slug(), identity.clone());
        Ok(identity)
    }

    fn list(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, StoreError> {
        Ok(self
            .identities
            .read()
            .values()
            .filter(|identity| filter.matches(identity))
            .cloned()
            .collect())
    }

    fn remove(&self, slug: &str) -> Result<Identity, StoreError> {
        self.identities
            .write()
            .remove(slug)
            .ok_or_else(|| StoreError::IdentityNotFound {
                slug: slug.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_replaces_same_slug() {
        let store = MemoryIdentityStore::new();
        let network = NetworkType::MijinTest;
        let first = store
            .save(KeyPair::from_seed(&[1; 32]), network, "a", "acme", "alice")
            .unwrap();
        let second = store
            .save(KeyPair::from_seed(&[2; 32]), network, "b", "acme", "alice")
            .unwrap();

        assert_eq!(store.len(), 1);
        let found = store.find("acme", "alice").unwrap();
        assert_eq!(found.address(), second.address());
        assert_ne!(found.address(), first.address());
    }

    #[test]
    fn test_empty_scope_has_no_owner() {
        let store = MemoryIdentityStore::new();
        let scope = store.find_scope("acme").unwrap();
        assert!(scope.identities.is_empty());
        assert!(scope.owner().is_none());
    }
}

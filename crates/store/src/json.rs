//! JSON file identity store.

use crate::{not_found, IdentityFilter, IdentityStore, StoreError};
use bizledger_types::{Identity, KeyPair, NetworkType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One stored identity. The slug is the map key.
#[derive(Clone, Serialize, Deserialize)]
struct StoredIdentity {
    private_key: String,
    network: NetworkType,
    url: String,
    scope: String,
    name: String,
}

impl StoredIdentity {
    fn from_identity(identity: &Identity) -> Self {
        Self {
            private_key: identity.keypair.private_key_hex(),
            network: identity.network,
            url: identity.url.clone(),
            scope: identity.scope.clone(),
            name: identity.name.clone(),
        }
    }

    fn into_identity(self, slug: &str) -> Result<Identity, StoreError> {
        let keypair =
            KeyPair::from_private_hex(&self.private_key).map_err(|source| StoreError::InvalidKey {
                slug: slug.to_string(),
                source,
            })?;
        Ok(Identity::new(
            keypair,
            self.network,
            self.url,
            self.scope,
            self.name,
        ))
    }
}

type IdentityFile = BTreeMap<String, StoredIdentity>;

/// Identities persisted as a JSON object keyed by slug.
///
/// The file is read on every call and rewritten on every change, so several
/// invocations can share it. A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct JsonIdentityStore {
    path: PathBuf,
}

impl JsonIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Result<IdentityFile, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Identity file missing, store is empty");
                return Ok(IdentityFile::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Write through a temporary file so a crash never leaves a torn file.
    fn write(&self, identities: &IdentityFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(identities)
            .expect("identity file serialization should never fail");
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl IdentityStore for JsonIdentityStore {
    fn find(&self, scope: &str, name: &str) -> Result<Identity, StoreError> {
        let slug = bizledger_types::slug(scope, name);
        let mut identities = self.read()?;
        match identities.remove(&slug) {
            Some(stored) => stored.into_identity(&slug),
            None => Err(not_found(scope, name)),
        }
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
        let mut identities = self.read()?;
        identities.insert(identity.slug(), StoredIdentity::from_identity(&identity));
        self.write(&identities)?;
        info!(
            slug = %identity.slug(),
            address = %identity.address(),
            path = %self.path.display(),
            "Identity saved"
        );
        Ok(identity)
    }

    fn list(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, StoreError> {
        let mut out = Vec::new();
        for (slug, stored) in self.read()? {
            let identity = stored.into_identity(&slug)?;
            if filter.matches(&identity) {
                out.push(identity);
            }
        }
        Ok(out)
    }

    fn remove(&self, slug: &str) -> Result<Identity, StoreError> {
        let mut identities = self.read()?;
        let stored = identities
            .remove(slug)
            .ok_or_else(|| StoreError::IdentityNotFound {
                slug: slug.to_string(),
            })?;
        self.write(&identities)?;
        info!(slug = %slug, "Identity removed");
        stored.into_identity(slug)
    }
}

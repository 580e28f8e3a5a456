// crates/canopy-store/src/credentials.rs

use std::collections::HashMap;
use std::sync::RwLock;

use canopy_core::{CanopyError, CredentialProvider, RequesterCredentials};

use crate::poisoned;

/// In-memory `CredentialProvider` keyed by requester id.
#[derive(Debug, Default)]
pub struct InMemoryCredentialDirectory {
    credentials: RwLock<HashMap<String, RequesterCredentials>>,
}

impl InMemoryCredentialDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register credentials under their `requester_id`.
    pub fn insert(&self, credentials: RequesterCredentials) -> Result<(), CanopyError> {
        let id = credentials
            .requester_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| CanopyError::Validation("Credentials need a requester id".into()))?;
        self.credentials.write().map_err(poisoned)?.insert(id, credentials);
        Ok(())
    }
}

impl CredentialProvider for InMemoryCredentialDirectory {
    fn credentials_for(&self, requester_id: &str) -> Result<Option<RequesterCredentials>, CanopyError> {
        Ok(self.credentials.read().map_err(poisoned)?.get(requester_id).cloned())
    }
}

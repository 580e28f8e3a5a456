// crates/canopy-store/src/profiles.rs

use std::collections::HashMap;
use std::sync::RwLock;

use canopy_core::{CanopyError, FeedbackProfile, KeyedLocks, ProfileStore};

use crate::poisoned;

/// In-memory `ProfileStore` keyed by content id.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, FeedbackProfile>>,
    locks: KeyedLocks,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn get(&self, content_id: &str) -> Result<Option<FeedbackProfile>, CanopyError> {
        Ok(self.profiles.read().map_err(poisoned)?.get(content_id).cloned())
    }

    fn put(&self, profile: FeedbackProfile) -> Result<(), CanopyError> {
        if profile.content_id.trim().is_empty() {
            return Err(CanopyError::Validation("Profile content id is required".into()));
        }
        self.profiles
            .write()
            .map_err(poisoned)?
            .insert(profile.content_id.clone(), profile);
        Ok(())
    }

    fn writer_locks(&self) -> &KeyedLocks {
        &self.locks
    }
}

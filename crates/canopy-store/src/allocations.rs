// crates/canopy-store/src/allocations.rs

use std::collections::HashMap;
use std::sync::RwLock;

use canopy_core::{AllocationStore, CanopyError, KeyedLocks, StewardshipAllocation};

use crate::poisoned;

/// In-memory `AllocationStore` keyed by allocation id.
#[derive(Debug, Default)]
pub struct InMemoryAllocationStore {
    allocations: RwLock<HashMap<String, StewardshipAllocation>>,
    locks: KeyedLocks,
}

impl InMemoryAllocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut allocations: Vec<StewardshipAllocation>) -> Vec<StewardshipAllocation> {
        allocations.sort_by(|a, b| a.effective_from.cmp(&b.effective_from).then(a.id.cmp(&b.id)));
        allocations
    }
}

impl AllocationStore for InMemoryAllocationStore {
    fn list_for_content(&self, content_id: &str) -> Result<Vec<StewardshipAllocation>, CanopyError> {
        let allocations = self.allocations.read().map_err(poisoned)?;
        Ok(Self::sorted(
            allocations
                .values()
                .filter(|a| a.content_id == content_id)
                .cloned()
                .collect(),
        ))
    }

    fn get(&self, allocation_id: &str) -> Result<Option<StewardshipAllocation>, CanopyError> {
        let allocations = self.allocations.read().map_err(poisoned)?;
        Ok(allocations.get(allocation_id).cloned())
    }

    fn list_for_steward(&self, steward_id: &str) -> Result<Vec<StewardshipAllocation>, CanopyError> {
        let allocations = self.allocations.read().map_err(poisoned)?;
        Ok(Self::sorted(
            allocations
                .values()
                .filter(|a| a.steward_id == steward_id)
                .cloned()
                .collect(),
        ))
    }

    fn commit(&self, content_id: &str, batch: Vec<StewardshipAllocation>) -> Result<(), CanopyError> {
        if let Some(stray) = batch.iter().find(|a| a.content_id != content_id || a.id.is_empty()) {
            return Err(CanopyError::Validation(format!(
                "Allocation '{}' does not belong to content {}",
                stray.id, content_id
            )));
        }
        let mut allocations = self.allocations.write().map_err(poisoned)?;
        for allocation in batch {
            allocations.insert(allocation.id.clone(), allocation);
        }
        Ok(())
    }

    fn writer_locks(&self) -> &KeyedLocks {
        &self.locks
    }
}

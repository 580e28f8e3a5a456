// crates/canopy-core/src/keyed_lock.rs
//
// Single-writer-per-key discipline for mutating operations.
//
// Reads never take these locks. Every mutation on a content id (allocation
// create/dispute/resolve, profile change) holds the key's writer slot for the
// whole read-validate-commit sequence, so two writers can never interleave on
// the same content item. The registry lives in the store being written, so
// every ledger or registry built over that store shares it.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::CanopyError;

/// What a writer does when the key is already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LockPolicy {
    /// Block until the current writer releases the key.
    #[default]
    Wait,
    /// Return `CanopyError::Conflict` immediately.
    FailFast,
}

/// Registry of keys currently held by a writer.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    policy: LockPolicy,
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl KeyedLocks {
    pub fn new(policy: LockPolicy) -> Self {
        Self {
            policy,
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }

    pub fn policy(&self) -> LockPolicy {
        self.policy
    }

    /// Acquire the writer slot for `key` under the registry's own policy.
    /// The slot is released when the returned guard drops.
    pub fn acquire(&self, key: &str) -> Result<KeyGuard<'_>, CanopyError> {
        self.acquire_with(key, self.policy)
    }

    /// Acquire the writer slot for `key`, waiting or failing per `policy`.
    pub fn acquire_with(&self, key: &str, policy: LockPolicy) -> Result<KeyGuard<'_>, CanopyError> {
        let mut held = self.lock_set();
        while held.contains(key) {
            match policy {
                LockPolicy::FailFast => {
                    tracing::warn!(key, "Rejected concurrent mutation");
                    return Err(CanopyError::Conflict(format!(
                        "Content {} is locked by another writer",
                        key
                    )));
                }
                LockPolicy::Wait => {
                    held = self
                        .released
                        .wait(held)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            }
        }
        held.insert(key.to_string());
        Ok(KeyGuard {
            locks: self,
            key: key.to_string(),
        })
    }

    /// Whether `key` is currently held.
    pub fn is_held(&self, key: &str) -> bool {
        self.lock_set().contains(key)
    }

    fn lock_set(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set is only mutated by insert/remove, so a poisoned guard still
        // holds consistent data.
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Writer slot for one key; releases on drop.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
}

impl KeyGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.lock_set();
        held.remove(&self.key);
        drop(held);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fail_fast_conflict() {
        let locks = KeyedLocks::new(LockPolicy::FailFast);
        let guard = locks.acquire("c1").unwrap();
        assert!(locks.is_held("c1"));

        let err = locks.acquire("c1").unwrap_err();
        assert!(matches!(err, CanopyError::Conflict(_)));

        // Other keys are independent.
        assert!(locks.acquire("c2").is_ok());

        drop(guard);
        assert!(!locks.is_held("c1"));
        assert!(locks.acquire("c1").is_ok());
    }

    #[test]
    fn test_caller_policy_overrides_registry_default() {
        let locks = KeyedLocks::default();
        let _guard = locks.acquire("c1").unwrap();
        let err = locks.acquire_with("c1", LockPolicy::FailFast).unwrap_err();
        assert!(matches!(err, CanopyError::Conflict(_)));
    }

    #[test]
    fn test_wait_serializes_writers() {
        let locks = Arc::new(KeyedLocks::new(LockPolicy::Wait));
        let in_section = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let in_section = Arc::clone(&in_section);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    let _guard = locks.acquire("shared").unwrap();
                    let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    thread::yield_now();
                    in_section.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(!locks.is_held("shared"));
    }
}

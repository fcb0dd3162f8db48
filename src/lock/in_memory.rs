use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use super::{Lease, LockStore, StoreError};
use crate::key::LockKey;

/// In-process lock store backed by a `HashMap` of key → lease expiry.
///
/// Follows the same reserve/remove semantics as the Redis store: a key is
/// reservable once absent or past its expiry, and removal is unconditional.
/// Useful for tests and for coordinating threads of a single process.
///
/// An expiry of `None` means the lease outlasts anything `Instant` can
/// represent. Expired entries are pruned on each reservation.
pub struct InMemoryStore {
    leases: Mutex<HashMap<String, Option<Instant>>>,
}

fn unexpired(expires_at: &Option<Instant>, now: Instant) -> bool {
    expires_at.map_or(true, |expires_at| expires_at > now)
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `key` is currently reserved and unexpired.
    pub fn is_held(&self, key: &LockKey) -> Result<bool, StoreError> {
        let leases = self
            .leases
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(leases
            .get(key.as_str())
            .is_some_and(|expires_at| unexpired(expires_at, Instant::now())))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LockStore for InMemoryStore {
    fn reserve(&self, key: &LockKey, lease: Lease) -> Result<bool, StoreError> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        let now = Instant::now();
        leases.retain(|_, expires_at| unexpired(expires_at, now));
        if leases.contains_key(key.as_str()) {
            return Ok(false);
        }
        leases.insert(
            key.as_str().to_string(),
            now.checked_add(lease.as_duration()),
        );
        Ok(true)
    }

    fn remove(&self, key: &LockKey) -> Result<(), StoreError> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        leases.remove(key.as_str());
        Ok(())
    }
}

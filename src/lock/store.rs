use std::sync::Arc;
use std::time::Duration;

use super::StoreError;
use crate::key::LockKey;

/// Time-to-live attached to a reserved key, in whole seconds.
///
/// The store owns the lease; the client never refreshes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Lease(u64);

impl Lease {
    /// Longest lease Redis accepts for `EXPIRE` once it converts to
    /// milliseconds and adds the current time.
    pub const MAX_SECS: u64 = i64::MAX as u64 / 1000 / 2;

    /// Clamped to `1..=MAX_SECS`.
    pub fn from_secs(secs: u64) -> Self {
        Lease(secs.clamp(1, Self::MAX_SECS))
    }

    /// Lease covering `wait`, rounded up to whole seconds and never below one.
    ///
    /// A lock acquired with a wait budget is leased for that same budget, so
    /// protected work that outlives it can lose the lock to another caller.
    /// Budgets beyond [`Lease::MAX_SECS`] get the longest lease.
    pub fn covering(wait: Duration) -> Self {
        let mut secs = wait.as_secs();
        if wait.subsec_nanos() > 0 {
            secs = secs.saturating_add(1);
        }
        Lease::from_secs(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

/// The store capability the mutex consumes.
///
/// Redis implements it with a server-side script; `InMemoryStore` implements
/// it with a map of expiry instants for single-process use and tests.
pub trait LockStore: Send + Sync {
    /// Set `key` only if absent and give it `lease` as one atomic step.
    /// Returns `Ok(true)` only if both happened.
    fn reserve(&self, key: &LockKey, lease: Lease) -> Result<bool, StoreError>;

    /// Delete `key` regardless of who holds it. Deleting a missing key succeeds.
    fn remove(&self, key: &LockKey) -> Result<(), StoreError>;
}

impl<S: LockStore + ?Sized> LockStore for Arc<S> {
    fn reserve(&self, key: &LockKey, lease: Lease) -> Result<bool, StoreError> {
        (**self).reserve(key, lease)
    }

    fn remove(&self, key: &LockKey) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

impl<S: LockStore + ?Sized> LockStore for &S {
    fn reserve(&self, key: &LockKey, lease: Lease) -> Result<bool, StoreError> {
        (**self).reserve(key, lease)
    }

    fn remove(&self, key: &LockKey) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

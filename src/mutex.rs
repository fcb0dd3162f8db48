//! The mutex handle: scoped acquisition with guaranteed release.
//!
//! A [`Mutex`] holds immutable scoping (namespace and global scope) and a
//! shared store. Each call derives its own key and wait budget, so one
//! handle can be cloned and used from many threads at once.
//!
//! Acquisition polls at a fixed interval with no backoff or jitter. Many
//! contenders on one key retry in lockstep, which is fine for
//! low-contention coordination.
//!
//! The lease on an acquired key equals the caller's wait budget and is
//! never refreshed. Release deletes the key without checking ownership, so
//! work that outlives its lease may delete a lock that another caller has
//! since acquired.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::MutexConfig;
use crate::key::LockKey;
use crate::lock::{Lease, LockError, LockStore, RedisStore};

/// Cross-process mutex coordinated through a [`LockStore`].
///
/// ## Example
///
/// ```ignore
/// use redis_mutex::{Mutex, MutexConfig};
/// use std::time::Duration;
///
/// let config = MutexConfig::new("localhost:6379", "redisGoMutex", "ironmount");
/// let mutex = Mutex::connect(&config)?;
///
/// mutex.synchronise(
///     "action_save",
///     Duration::from_secs(30),
///     Duration::from_secs(2),
///     || save_everything(),
/// )?;
/// ```
pub struct Mutex<S: LockStore = RedisStore> {
    namespace: String,
    global_scope: String,
    store: Arc<S>,
}

impl Mutex<RedisStore> {
    /// Connect to Redis and build a handle from `config`.
    pub fn connect(config: &MutexConfig) -> Result<Self, LockError> {
        let store = RedisStore::connect(&config.store)?;
        Ok(Mutex::with_store(
            store,
            config.namespace.clone(),
            config.global_scope.clone(),
        ))
    }
}

impl<S: LockStore> Mutex<S> {
    pub fn with_store(
        store: S,
        namespace: impl Into<String>,
        global_scope: impl Into<String>,
    ) -> Self {
        Mutex::with_shared_store(Arc::new(store), namespace, global_scope)
    }

    /// Build a handle on a store that is already shared elsewhere.
    pub fn with_shared_store(
        store: Arc<S>,
        namespace: impl Into<String>,
        global_scope: impl Into<String>,
    ) -> Self {
        Mutex {
            namespace: namespace.into(),
            global_scope: global_scope.into(),
            store,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn global_scope(&self) -> &str {
        &self.global_scope
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key(&self, local_scope: &str) -> LockKey {
        LockKey::derive(&self.namespace, &self.global_scope, local_scope)
    }

    /// Make a single reservation attempt.
    ///
    /// Returns `Ok(None)` when someone else holds the key.
    pub fn try_acquire(
        &self,
        local_scope: &str,
        lease: Lease,
    ) -> Result<Option<LockGuard<'_, S>>, LockError> {
        let key = self.key(local_scope);
        if self.reserve(&key, lease)? {
            Ok(Some(LockGuard::new(self, key)))
        } else {
            Ok(None)
        }
    }

    /// Poll every `check_frequency` until the key is reserved or
    /// `wait_expiration` has elapsed.
    ///
    /// The key is leased for `wait_expiration` (rounded up to whole
    /// seconds). A zero budget times out without contacting the store.
    /// Store failures end the wait immediately and are not retried.
    pub fn acquire(
        &self,
        local_scope: &str,
        wait_expiration: Duration,
        check_frequency: Duration,
    ) -> Result<LockGuard<'_, S>, LockError> {
        let key = self.key(local_scope);
        self.wait_for(&key, wait_expiration, check_frequency)?;
        Ok(LockGuard::new(self, key))
    }

    /// Delete the key for `local_scope`, whoever holds it.
    pub fn release(&self, local_scope: &str) -> Result<(), LockError> {
        self.remove(&self.key(local_scope))
    }

    /// Acquire the lock for `local_scope`, run `work`, then release.
    ///
    /// If acquisition fails, `work` never runs and the error is returned.
    /// The key is released exactly once however `work` ends: normally, or
    /// while unwinding from a panic. A failed release after a normal return
    /// is reported as [`LockError::Release`]; `work` has already run by then.
    pub fn synchronise<T, F>(
        &self,
        local_scope: &str,
        wait_expiration: Duration,
        check_frequency: Duration,
        work: F,
    ) -> Result<T, LockError>
    where
        F: FnOnce() -> T,
    {
        tracing::debug!(local_scope, "about to acquire lock");
        let guard = self.acquire(local_scope, wait_expiration, check_frequency)?;
        let output = work();
        guard.release()?;
        Ok(output)
    }

    fn wait_for(
        &self,
        key: &LockKey,
        wait_expiration: Duration,
        check_frequency: Duration,
    ) -> Result<(), LockError> {
        let started = Instant::now();
        if wait_expiration.is_zero() {
            return Err(LockError::Timeout {
                key: key.clone(),
                waited: Duration::ZERO,
            });
        }
        // None means the budget is too large to represent; wait indefinitely.
        let deadline = started.checked_add(wait_expiration);
        let lease = Lease::covering(wait_expiration);

        loop {
            if self.reserve(key, lease)? {
                tracing::debug!(key = %key, waited = ?started.elapsed(), "lock acquired");
                return Ok(());
            }
            tracing::debug!(key = %key, retry_in = ?check_frequency, "lock held, waiting");

            thread::sleep(check_frequency);
            if deadline.is_some_and(|deadline| Instant::now() > deadline) {
                let waited = started.elapsed();
                tracing::debug!(key = %key, waited = ?waited, "wait expired without lock");
                return Err(LockError::Timeout {
                    key: key.clone(),
                    waited,
                });
            }
        }
    }

    fn reserve(&self, key: &LockKey, lease: Lease) -> Result<bool, LockError> {
        self.store
            .reserve(key, lease)
            .map_err(|source| LockError::Store {
                key: key.clone(),
                source,
            })
    }

    fn remove(&self, key: &LockKey) -> Result<(), LockError> {
        tracing::debug!(key = %key, "releasing lock");
        self.store.remove(key).map_err(|source| LockError::Release {
            key: key.clone(),
            source,
        })
    }
}

impl<S: LockStore> Clone for Mutex<S> {
    fn clone(&self) -> Self {
        Mutex {
            namespace: self.namespace.clone(),
            global_scope: self.global_scope.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

/// An acquired key. Released by [`LockGuard::release`], or on drop.
///
/// Dropping an unreleased guard deletes the key and logs any failure,
/// which is how the lock is freed when protected work panics.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct LockGuard<'a, S: LockStore> {
    mutex: &'a Mutex<S>,
    key: LockKey,
    released: bool,
}

impl<'a, S: LockStore> LockGuard<'a, S> {
    fn new(mutex: &'a Mutex<S>, key: LockKey) -> Self {
        LockGuard {
            mutex,
            key,
            released: false,
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Delete the key and report the outcome.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.mutex.remove(&self.key)
    }
}

impl<S: LockStore> Drop for LockGuard<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.mutex.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "failed to release lock on drop");
        }
    }
}

//! Mutual exclusion across processes that share nothing but a Redis server.
//!
//! A lock is a single Redis key, `namespace.global_scope.local_scope`,
//! reserved atomically with a lease and deleted when the protected work is
//! done. See [`Mutex::synchronise`] for the usual entry point.

mod config;
mod key;
mod lock;
mod mutex;

pub use config::{MutexConfig, StoreConfig};
pub use key::LockKey;
pub use lock::{InMemoryStore, Lease, LockError, LockStore, RedisStore, StoreError};
pub use mutex::{LockGuard, Mutex};

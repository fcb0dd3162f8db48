use std::time::Duration;

use thiserror::Error;

use crate::key::LockKey;

/// Failure talking to the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A Redis command or script failed (network, protocol, server error).
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),
    /// No pooled connection could be checked out.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    /// The in-process store state was poisoned by a panicking thread.
    #[error("store state poisoned: {0}")]
    Poisoned(String),
    /// The reservation script replied with something other than 0 or 1.
    #[error("unexpected reply from reservation script: {0}")]
    UnexpectedReply(i64),
}

/// Error type for mutex operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// The wait budget elapsed without acquiring the lock.
    #[error("wait expired without lock on {key} after {waited:?}")]
    Timeout { key: LockKey, waited: Duration },
    /// The store could not be reached while trying to acquire.
    #[error("store failed while acquiring {key}: {source}")]
    Store {
        key: LockKey,
        #[source]
        source: StoreError,
    },
    /// Deleting the key on release failed. Protected work, if any, already ran.
    #[error("failed to release {key}: {source}")]
    Release {
        key: LockKey,
        #[source]
        source: StoreError,
    },
    /// The store client could not be constructed.
    #[error("failed to connect to store: {0}")]
    Connect(#[source] StoreError),
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LockError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::Timeout { .. })
    }

    /// The key involved, for errors raised while operating on one.
    pub fn key(&self) -> Option<&LockKey> {
        match self {
            LockError::Timeout { key, .. }
            | LockError::Store { key, .. }
            | LockError::Release { key, .. } => Some(key),
            LockError::Connect(_) | LockError::Config(_) => None,
        }
    }
}

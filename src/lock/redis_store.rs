use redis::{Commands, Script};

use super::{Lease, LockError, LockStore, StoreError};
use crate::config::StoreConfig;
use crate::key::LockKey;

/// Sets the key only if absent and then gives it a TTL, all inside one
/// script so a reservation can never be left without an expiry.
/// Replies 1 only when both steps succeeded.
const RESERVE_SCRIPT: &str = r"
return redis.call('SETNX', KEYS[1], 1) == 1
    and redis.call('EXPIRE', KEYS[1], ARGV[1]) == 1
    and 1 or 0
";

/// Redis-backed lock store with its own connection pool.
///
/// Every operation checks out one connection for a single request and
/// hands it back when done, so nothing is held while a caller sleeps
/// between attempts or runs protected work.
pub struct RedisStore {
    pool: r2d2::Pool<redis::Client>,
    reserve: Script,
}

impl RedisStore {
    /// Builds the pool and opens `min_idle` connections up front.
    ///
    /// An unparsable address or an unreachable server is reported as
    /// [`LockError::Connect`] so the caller can decide whether to retry.
    pub fn connect(config: &StoreConfig) -> Result<Self, LockError> {
        config.validate()?;
        let client = redis::Client::open(config.url())
            .map_err(|e| LockError::Connect(StoreError::Redis(e)))?;
        let pool = r2d2::Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(config.connection_timeout())
            .build(client)
            .map_err(|e| LockError::Connect(StoreError::Pool(e)))?;
        tracing::debug!(address = %config.address, max_size = config.max_size, "redis pool ready");
        Ok(RedisStore {
            pool,
            reserve: Script::new(RESERVE_SCRIPT),
        })
    }

    /// Open and idle connection counts, for diagnostics.
    pub fn state(&self) -> r2d2::State {
        self.pool.state()
    }
}

impl LockStore for RedisStore {
    fn reserve(&self, key: &LockKey, lease: Lease) -> Result<bool, StoreError> {
        let mut conn = self.pool.get()?;
        tracing::debug!(key = %key, lease_secs = lease.as_secs(), "running reservation script");
        let reply: i64 = self
            .reserve
            .key(key.as_str())
            .arg(lease.as_secs())
            .invoke(&mut *conn)?;
        tracing::debug!(key = %key, reply, "reservation reply");
        match reply {
            1 => Ok(true),
            0 => Ok(false),
            other => Err(StoreError::UnexpectedReply(other)),
        }
    }

    fn remove(&self, key: &LockKey) -> Result<(), StoreError> {
        let mut conn = self.pool.get()?;
        let removed: i64 = conn.del(key.as_str())?;
        tracing::debug!(key = %key, removed, "deleted lock key");
        Ok(())
    }
}

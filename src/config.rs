//! Construction-time configuration for a [`Mutex`](crate::Mutex).
//!
//! Values are immutable once a mutex is built. They can be written out in
//! code, parsed from JSON, or read from `REDIS_MUTEX_*` environment variables.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lock::LockError;

pub const ENV_ADDRESS: &str = "REDIS_MUTEX_ADDRESS";
pub const ENV_NAMESPACE: &str = "REDIS_MUTEX_NAMESPACE";
pub const ENV_GLOBAL_SCOPE: &str = "REDIS_MUTEX_GLOBAL_SCOPE";
pub const ENV_POOL_SIZE: &str = "REDIS_MUTEX_POOL_SIZE";

/// Connection settings for the Redis store client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `host:port`, or a full `redis://` / `rediss://` URL.
    pub address: String,
    /// Upper bound on pooled connections.
    pub max_size: u32,
    /// Connections opened eagerly; with at least one, construction fails
    /// when the server is unreachable.
    pub min_idle: u32,
    /// How long to wait for a connection before giving up.
    pub connection_timeout_ms: u64,
}

impl StoreConfig {
    pub fn new(address: impl Into<String>) -> Self {
        StoreConfig {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// The address as a connection URL.
    pub fn url(&self) -> String {
        if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("redis://{}", self.address)
        }
    }

    pub fn validate(&self) -> Result<(), LockError> {
        if self.address.trim().is_empty() {
            return Err(LockError::Config("store address is empty".into()));
        }
        if self.max_size == 0 {
            return Err(LockError::Config("pool max_size must be at least 1".into()));
        }
        if self.min_idle > self.max_size {
            return Err(LockError::Config(format!(
                "pool min_idle ({}) exceeds max_size ({})",
                self.min_idle, self.max_size
            )));
        }
        if self.connection_timeout_ms == 0 {
            return Err(LockError::Config(
                "connection_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            address: "localhost:6379".into(),
            max_size: 80,
            min_idle: 1,
            connection_timeout_ms: 5_000,
        }
    }
}

/// Everything a mutex handle needs: where the store is and how keys are scoped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutexConfig {
    pub store: StoreConfig,
    pub namespace: String,
    pub global_scope: String,
}

impl MutexConfig {
    pub fn new(
        address: impl Into<String>,
        namespace: impl Into<String>,
        global_scope: impl Into<String>,
    ) -> Self {
        MutexConfig {
            store: StoreConfig::new(address),
            namespace: namespace.into(),
            global_scope: global_scope.into(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LockError> {
        let config: MutexConfig =
            serde_json::from_str(json).map_err(|e| LockError::Config(e.to_string()))?;
        config.store.validate()?;
        Ok(config)
    }

    /// Defaults overridden by any `REDIS_MUTEX_*` variables that are set.
    pub fn from_env() -> Result<Self, LockError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LockError> {
        let mut config = MutexConfig::default();
        if let Some(address) = lookup(ENV_ADDRESS) {
            config.store.address = address;
        }
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            config.namespace = namespace;
        }
        if let Some(global_scope) = lookup(ENV_GLOBAL_SCOPE) {
            config.global_scope = global_scope;
        }
        if let Some(size) = lookup(ENV_POOL_SIZE) {
            config.store.max_size = size.trim().parse().map_err(|_| {
                LockError::Config(format!("{} is not a number: {:?}", ENV_POOL_SIZE, size))
            })?;
            config.store.min_idle = config.store.min_idle.min(config.store.max_size);
        }
        config.store.validate()?;
        Ok(config)
    }
}

impl Default for MutexConfig {
    fn default() -> Self {
        MutexConfig {
            store: StoreConfig::default(),
            namespace: "redisGoMutex".into(),
            global_scope: String::new(),
        }
    }
}

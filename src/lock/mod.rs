mod error;
mod in_memory;
mod redis_store;
mod store;

pub use error::{LockError, StoreError};
pub use in_memory::InMemoryStore;
pub use redis_store::RedisStore;
pub use store::{Lease, LockStore};

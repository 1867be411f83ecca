//! Key-value store backends for the shorturl service.
//!
//! [`RedisStore`] is the production backend. [`InMemoryStore`] keeps the
//! same TTL semantics in process and backs the tests and the `in-memory`
//! storage mode.

pub mod clock;
pub mod memory;
pub mod redis;

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::memory::InMemoryStore;
pub use self::redis::RedisStore;
pub use shorturl_core::{KeyTtl, KeyValueStore, StorageError};

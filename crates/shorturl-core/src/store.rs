use crate::error::StorageError;
use async_trait::async_trait;
use std::time::Duration;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Remaining lifetime of a key, as reported by [`KeyValueStore::ttl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key exists and expires after the given duration.
    Expiring(Duration),
    /// The key exists and has no expiry.
    Persistent,
    /// The key does not exist.
    Missing,
}

/// The key-value store the short-link lifecycle is built on.
///
/// Values are plain UTF-8 strings. Every operation is a single round trip;
/// implementations must not retry internally.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value stored at `key`, or `None` if the key is absent.
    ///
    /// An empty stored value is returned as `Some("")`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes every entry in one atomic operation.
    async fn set_many(&self, entries: &[(String, String)]) -> Result<()>;

    /// Sets the time-to-live of `key`.
    ///
    /// Returns `false` if the key does not exist. A zero `ttl` removes the key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Reports the remaining time-to-live of `key`.
    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Stores `value` at `key` with the given `ttl` only if the key is absent.
    ///
    /// Returns `true` to exactly one caller among concurrent attempts.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;
}

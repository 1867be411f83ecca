use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use parking_lot::RwLock;
use shorturl_core::store::Result;
use shorturl_core::{KeyTtl, KeyValueStore, StorageError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// In-memory storage slot for a single key.
#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expire_at: Option<Timestamp>,
}

impl Slot {
    fn is_expired(&self, now: Timestamp) -> bool {
        self.expire_at.is_some_and(|expire_at| now >= expire_at)
    }
}

/// In-memory implementation of [`KeyValueStore`].
///
/// Mirrors the Redis semantics the lease logic depends on: writes clear any
/// previous TTL, a zero TTL deletes the key, and expired keys behave exactly
/// like absent ones. Expiry is evaluated lazily against the injected
/// [`Clock`].
///
/// A single lock guards the whole map so multi-key writes are observed
/// atomically. Clones share the same data.
#[derive(Clone)]
pub struct InMemoryStore<C = SystemClock> {
    slots: Arc<RwLock<HashMap<String, Slot>>>,
    clock: C,
}

impl InMemoryStore<SystemClock> {
    /// Creates an empty store driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryStore<C> {
    /// Creates an empty store driven by `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Returns the number of keys that have not expired.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.slots
            .read()
            .values()
            .filter(|slot| !slot.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired key and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|_, slot| !slot.is_expired(now));
        before - slots.len()
    }

    /// Removes `key` if it is still expired once the write lock is held.
    fn evict(&self, key: &str, now: Timestamp) {
        let mut slots = self.slots.write();
        if slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
            trace!(key = %key, "evicting expired key");
            slots.remove(key);
        }
    }

    fn deadline(&self, ttl: Duration) -> Result<Timestamp> {
        let ttl = SignedDuration::try_from(ttl)
            .map_err(|e| StorageError::Operation(format!("invalid ttl {ttl:?}: {e}")))?;
        self.clock
            .now()
            .checked_add(ttl)
            .map_err(|e| StorageError::Operation(format!("ttl out of range: {e}")))
    }
}

impl<C> std::fmt::Debug for InMemoryStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("keys", &self.slots.read().len())
            .finish()
    }
}

#[async_trait]
impl<C: Clock> KeyValueStore for InMemoryStore<C> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now();
        {
            let slots = self.slots.read();
            match slots.get(key) {
                None => return Ok(None),
                Some(slot) if !slot.is_expired(now) => return Ok(Some(slot.value.clone())),
                Some(_) => {}
            }
        }

        self.evict(key, now);
        Ok(None)
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<()> {
        let mut slots = self.slots.write();
        for (key, value) in entries {
            trace!(key = %key, "writing key");
            slots.insert(
                key.clone(),
                Slot {
                    value: value.clone(),
                    expire_at: None,
                },
            );
        }
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = self.clock.now();
        let deadline = if ttl.is_zero() {
            None
        } else {
            Some(self.deadline(ttl)?)
        };

        let mut slots = self.slots.write();
        let live = slots.get(key).is_some_and(|slot| !slot.is_expired(now));
        if !live {
            slots.remove(key);
            return Ok(false);
        }

        match deadline {
            Some(expire_at) => {
                if let Some(slot) = slots.get_mut(key) {
                    slot.expire_at = Some(expire_at);
                }
            }
            None => {
                slots.remove(key);
            }
        }
        Ok(true)
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let now = self.clock.now();
        {
            let slots = self.slots.read();
            match slots.get(key) {
                None => return Ok(KeyTtl::Missing),
                Some(slot) if slot.is_expired(now) => {}
                Some(Slot {
                    expire_at: None, ..
                }) => return Ok(KeyTtl::Persistent),
                Some(Slot {
                    expire_at: Some(expire_at),
                    ..
                }) => {
                    return Ok(KeyTtl::Expiring(
                        expire_at.duration_since(now).unsigned_abs(),
                    ))
                }
            }
        }

        self.evict(key, now);
        Ok(KeyTtl::Missing)
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let now = self.clock.now();
        let expire_at = self.deadline(ttl)?;

        let mut slots = self.slots.write();
        if slots.get(key).is_some_and(|slot| !slot.is_expired(now)) {
            return Ok(false);
        }

        slots.insert(
            key.to_owned(),
            Slot {
                value: value.to_owned(),
                expire_at: Some(expire_at),
            },
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn store() -> (InMemoryStore<ManualClock>, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        (InMemoryStore::with_clock(clock.clone()), clock)
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[tokio::test]
    async fn set_many_and_get() {
        let (store, _) = store();

        store
            .set_many(&[pair("a", "1"), pair("b", "2")])
            .await
            .unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.get("c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_value_is_not_absent() {
        let (store, _) = store();

        store.set_many(&[pair("a", "")]).await.unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn written_keys_are_persistent_until_expired() {
        let (store, _) = store();

        store.set_many(&[pair("a", "1")]).await.unwrap();
        assert_eq!(store.ttl("a").await.unwrap(), KeyTtl::Persistent);

        assert!(store.expire("a", DAY).await.unwrap());
        assert_eq!(store.ttl("a").await.unwrap(), KeyTtl::Expiring(DAY));
    }

    #[tokio::test]
    async fn rewriting_clears_ttl() {
        let (store, _) = store();

        store.set_many(&[pair("a", "1")]).await.unwrap();
        store.expire("a", DAY).await.unwrap();
        store.set_many(&[pair("a", "2")]).await.unwrap();

        assert_eq!(store.ttl("a").await.unwrap(), KeyTtl::Persistent);
    }

    #[tokio::test]
    async fn keys_disappear_after_ttl() {
        let (store, clock) = store();

        store.set_many(&[pair("a", "1")]).await.unwrap();
        store.expire("a", Duration::from_secs(10)).await.unwrap();

        clock.advance(SignedDuration::from_secs(9));
        assert_eq!(
            store.ttl("a").await.unwrap(),
            KeyTtl::Expiring(Duration::from_secs(1))
        );

        clock.advance(SignedDuration::from_secs(1));
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.ttl("a").await.unwrap(), KeyTtl::Missing);
        assert!(!store.expire("a", DAY).await.unwrap());
    }

    #[tokio::test]
    async fn reads_evict_expired_keys() {
        let (store, clock) = store();
        for i in 0..1000 {
            let key = format!("k{i}");
            store.set_many(&[pair(&key, "v")]).await.unwrap();
            store.expire(&key, Duration::from_secs(1)).await.unwrap();
        }

        clock.advance(SignedDuration::from_secs(10));
        for i in 0..500 {
            assert_eq!(store.get(&format!("k{i}")).await.unwrap(), None);
        }
        for i in 500..1000 {
            assert_eq!(store.ttl(&format!("k{i}")).await.unwrap(), KeyTtl::Missing);
        }

        assert!(store.is_empty());
        assert!(store.slots.read().is_empty());
    }

    #[tokio::test]
    async fn purge_drops_only_expired_keys() {
        let (store, clock) = store();
        store
            .set_many(&[pair("a", "1"), pair("b", "2"), pair("c", "3")])
            .await
            .unwrap();
        store.expire("a", Duration::from_secs(1)).await.unwrap();
        store.expire("b", DAY).await.unwrap();

        clock.advance(SignedDuration::from_secs(10));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.slots.read().len(), 2);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.get("c").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn zero_ttl_deletes() {
        let (store, _) = store();

        store.set_many(&[pair("a", "1")]).await.unwrap();
        assert!(store.expire("a", Duration::ZERO).await.unwrap());

        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expire_missing_key() {
        let (store, _) = store();

        assert!(!store.expire("nope", DAY).await.unwrap());
        assert_eq!(store.ttl("nope").await.unwrap(), KeyTtl::Missing);
    }

    #[tokio::test]
    async fn set_if_absent_only_once_per_ttl() {
        let (store, clock) = store();

        assert!(store.set_if_absent("lock", "1", DAY).await.unwrap());
        assert!(!store.set_if_absent("lock", "1", DAY).await.unwrap());
        assert_eq!(store.ttl("lock").await.unwrap(), KeyTtl::Expiring(DAY));

        clock.advance(SignedDuration::from_hours(24));
        assert!(store.set_if_absent("lock", "1", DAY).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_set_if_absent_has_one_winner() {
        let store = InMemoryStore::new();
        let mut handles = vec![];

        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set_if_absent("lock", "1", DAY).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}

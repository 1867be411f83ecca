use shorturl_core::keys::{forward_key, lock_key, reverse_key};
use shorturl_core::store::Result;
use shorturl_core::{EncodedLongUrl, KeyTtl, KeyValueStore, ShortCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// How far a renewal pushes the expiry out, and how long a renewal lock lives.
pub const DEFAULT_RENEWAL_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Tunables for the lease lifecycle.
#[derive(Debug, Clone, TypedBuilder)]
pub struct LeaseSettings {
    /// Lock lifetime and extension step of renew-on-access.
    #[builder(default = DEFAULT_RENEWAL_PERIOD)]
    pub renewal_period: Duration,
}

impl Default for LeaseSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The mapping-level view of a [`KeyValueStore`].
///
/// A mapping is two entries, forward (`code -> url`) and reverse
/// (`encoded url -> code`). They are always written together and their
/// expiry is always armed together.
#[derive(Debug)]
pub struct LeaseStore<S> {
    store: Arc<S>,
}

impl<S> Clone for LeaseStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore> LeaseStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Returns the underlying store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Looks up the long URL of a short code.
    pub async fn get_forward(&self, code: &ShortCode) -> Result<Option<String>> {
        let key = forward_key(code);
        trace!(code = %code, "looking up forward entry");

        match self.store.get(&key).await? {
            Some(url) if url.is_empty() => {
                warn!(code = %code, "forward entry holds an empty url, ignoring it");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Looks up the short code already assigned to an encoded long URL.
    pub async fn get_reverse(&self, encoded: &EncodedLongUrl) -> Result<Option<ShortCode>> {
        let key = reverse_key(encoded);
        trace!(key = %key, "looking up reverse entry");

        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match ShortCode::new(raw) {
            Ok(code) => Ok(Some(code)),
            Err(e) => {
                warn!(key = %key, error = %e, "reverse entry holds an unusable short code, ignoring it");
                Ok(None)
            }
        }
    }

    /// Writes both directions of a mapping in one atomic store call.
    pub async fn create_mapping(
        &self,
        encoded: &EncodedLongUrl,
        code: &ShortCode,
        long_url: &str,
    ) -> Result<()> {
        debug!(code = %code, "creating mapping");
        self.store
            .set_many(&[
                (reverse_key(encoded), code.as_str().to_owned()),
                (forward_key(code), long_url.to_owned()),
            ])
            .await
    }

    /// Sets the expiry of both directions of a mapping to `ttl`.
    ///
    /// Returns `false` if the forward entry no longer exists, in which case
    /// the code no longer resolves.
    pub async fn arm_expiry(
        &self,
        code: &ShortCode,
        encoded: &EncodedLongUrl,
        ttl: Duration,
    ) -> Result<bool> {
        trace!(code = %code, ttl_secs = ttl.as_secs(), "arming expiry");
        let forward_live = self.store.expire(&forward_key(code), ttl).await?;
        self.store.expire(&reverse_key(encoded), ttl).await?;
        Ok(forward_live)
    }

    /// Takes the renewal lock of `code` for `period`.
    ///
    /// Returns `true` only to the caller that created the lock.
    pub async fn try_acquire_lock(&self, code: &ShortCode, period: Duration) -> Result<bool> {
        self.store.set_if_absent(&lock_key(code), "1", period).await
    }

    /// Reports the remaining lifetime of the forward entry of `code`.
    pub async fn remaining_ttl(&self, code: &ShortCode) -> Result<KeyTtl> {
        self.store.ttl(&forward_key(code)).await
    }
}

use crate::lease::{LeaseSettings, LeaseStore};
use async_trait::async_trait;
use shorturl_core::{
    EncodedLongUrl, KeyTtl, KeyValueStore, ShortCode, ShortenParams, Shortener, ShortenerError,
};
use shorturl_generator::Generator;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Outcome of a renew-on-access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renewal {
    /// Both directions now expire after `ttl`.
    Extended { ttl: Duration },
    /// Another renewal already happened within the current lock period.
    Locked,
    /// The mapping has no expiry; it was left untouched.
    Persistent,
    /// The mapping expired before its TTL could be read.
    Missing,
}

/// A concrete implementation of the `Shortener` trait on top of a key-value store.
///
/// This service handles:
/// - Idempotent shortening (an existing live code is reused)
/// - Keep-alive on shorten (every call re-arms the full TTL)
/// - Renew-on-access (a resolve extends the TTL by one renewal period,
///   at most once per period)
///
/// Note: The `Generator` gives no uniqueness guarantee and no collision
/// check is performed before a new mapping is written.
#[derive(Debug)]
pub struct ShortenerService<S, G> {
    lease: LeaseStore<S>,
    generator: Arc<G>,
    settings: LeaseSettings,
}

impl<S, G> Clone for ShortenerService<S, G> {
    fn clone(&self) -> Self {
        Self {
            lease: self.lease.clone(),
            generator: Arc::clone(&self.generator),
            settings: self.settings.clone(),
        }
    }
}

impl<S: KeyValueStore, G: Generator> ShortenerService<S, G> {
    /// Creates a new `ShortenerService` with default lease settings.
    pub fn new(store: S, generator: G) -> Self {
        Self::with_settings(store, generator, LeaseSettings::default())
    }

    pub fn with_settings(store: S, generator: G, settings: LeaseSettings) -> Self {
        Self {
            lease: LeaseStore::new(store),
            generator: Arc::new(generator),
            settings,
        }
    }

    /// Returns the lease view of the underlying store.
    pub fn lease(&self) -> &LeaseStore<S> {
        &self.lease
    }

    /// Validates that the URL has a valid format (has a scheme and host).
    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        };
        if scheme.is_empty() || rest.is_empty() {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        }

        let scheme = scheme.to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                scheme
            )));
        }

        Ok(())
    }

    /// Extends the lease of a mapping that was just resolved.
    ///
    /// Only the caller that takes the renewal lock extends anything, so the
    /// store sees at most one extension per code per renewal period. The new
    /// TTL is the remaining TTL plus one renewal period.
    pub async fn renew(&self, code: &ShortCode, long_url: &str) -> Result<Renewal, ShortenerError> {
        let period = self.settings.renewal_period;

        if !self.lease.try_acquire_lock(code, period).await? {
            trace!(code = %code, "renewal lock held, skipping");
            return Ok(Renewal::Locked);
        }

        match self.lease.remaining_ttl(code).await? {
            KeyTtl::Persistent => {
                debug!(code = %code, "mapping has no expiry, leaving it alone");
                Ok(Renewal::Persistent)
            }
            KeyTtl::Missing => {
                debug!(code = %code, "mapping vanished before renewal");
                Ok(Renewal::Missing)
            }
            KeyTtl::Expiring(remaining) => {
                let ttl = remaining.saturating_add(period);
                let encoded = EncodedLongUrl::new(long_url);
                if !self.lease.arm_expiry(code, &encoded, ttl).await? {
                    debug!(code = %code, "mapping vanished during renewal");
                    return Ok(Renewal::Missing);
                }
                info!(code = %code, ttl_secs = ttl.as_secs(), "renewed");
                Ok(Renewal::Extended { ttl })
            }
        }
    }
}

#[async_trait]
impl<S: KeyValueStore, G: Generator> Shortener for ShortenerService<S, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode, ShortenerError> {
        Self::validate_url(&params.original_url)?;

        let encoded = EncodedLongUrl::new(&params.original_url);

        if let Some(code) = self.lease.get_reverse(&encoded).await? {
            // also refreshes a reused mapping to the full ttl
            if self.lease.arm_expiry(&code, &encoded, params.ttl).await? {
                debug!(code = %code, "reusing existing short code");
                info!(code = %code, url = %params.original_url, "shortened");
                return Ok(code);
            }
            warn!(code = %code, "reverse entry outlived its forward entry, issuing a new code");
        }

        let code: ShortCode = self.generator.generate().into();
        self.lease
            .create_mapping(&encoded, &code, &params.original_url)
            .await?;
        self.lease.arm_expiry(&code, &encoded, params.ttl).await?;

        info!(code = %code, url = %params.original_url, "shortened");
        Ok(code)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>, ShortenerError> {
        let Some(long_url) = self.lease.get_forward(code).await? else {
            trace!(code = %code, "short code not found");
            return Ok(None);
        };

        if let Err(e) = self.renew(code, &long_url).await {
            warn!(code = %code, error = %e, "renewal failed");
        }

        debug!(code = %code, url = %long_url, "resolved short code");
        Ok(Some(long_url))
    }
}

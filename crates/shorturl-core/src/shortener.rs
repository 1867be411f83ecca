use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::time::Duration;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// How long the mapping stays alive without being renewed.
    pub ttl: Duration,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the short code of a URL, creating one if the URL has no live mapping.
    ///
    /// Every call re-arms the mapping's expiry to `params.ttl`.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode>;

    /// Resolves a short code to its original URL.
    /// Returns `None` if the code does not exist or has expired.
    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>>;
}

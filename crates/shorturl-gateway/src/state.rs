use std::sync::Arc;
use std::time::Duration;

use shorturl_core::Shortener;

use crate::proxy::Proxy;

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    base_url: String,
    default_ttl: Duration,
    proxy: Proxy,
}

impl AppState {
    /// Creates the shared handler state.
    ///
    /// Short URLs are rendered as `https://<domain>/<code>`.
    pub fn new(
        shortener: Arc<dyn Shortener>,
        domain: &str,
        default_ttl: Duration,
        proxy: Proxy,
    ) -> Self {
        Self {
            shortener,
            base_url: format!("https://{}", domain.trim_end_matches('/')),
            default_ttl,
            proxy,
        }
    }

    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

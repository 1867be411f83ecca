use std::time::Duration;

use axum::body::Body;
use axum::http::header::{
    CONNECTION, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING,
    UPGRADE,
};
use axum::http::{HeaderMap, HeaderName};
use axum::response::Response;
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid proxy target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// Forwards GET requests to an arbitrary upstream URL.
///
/// The upstream answer (status, end-to-end headers, body) is streamed back
/// untouched: redirects are not followed and content encodings are not
/// undone. Connections go straight to the upstream, ignoring any system
/// proxy settings.
#[derive(Debug, Clone)]
pub struct Proxy {
    client: reqwest::Client,
}

impl Proxy {
    /// Creates a proxy whose upstream requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// Sends a GET for `target` carrying the end-to-end part of `headers`.
    pub async fn forward(&self, target: &str, headers: &HeaderMap) -> Result<Response, ProxyError> {
        let url = parse_target(target)?;

        let mut request_headers = headers.clone();
        strip_hop_by_hop(&mut request_headers);
        request_headers.remove(HOST);

        debug!(target = %url, "forwarding request upstream");
        let upstream = self
            .client
            .get(url)
            .headers(request_headers)
            .send()
            .await?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);
        info!(target = %target, status = %status, "proxied");

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

fn parse_target(target: &str) -> Result<Url, ProxyError> {
    let invalid = |reason: String| ProxyError::InvalidTarget {
        target: target.to_string(),
        reason,
    };

    let url = Url::parse(target).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Removes headers that only make sense on a single connection, including
/// any listed in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }

    for name in [
        CONNECTION,
        PROXY_AUTHENTICATE,
        PROXY_AUTHORIZATION,
        TE,
        TRAILER,
        TRANSFER_ENCODING,
        UPGRADE,
        HeaderName::from_static("keep-alive"),
    ] {
        headers.remove(name);
    }
}

use axum::extract::{OriginalUri, Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use shorturl_core::ShortCode;

use crate::error::{AppError, Result};
use crate::state::AppState;

const PROXY_PREFIX: &str = "/proxy/";

/// Resolves a short code and proxies the request to its long URL.
pub async fn sub_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let code = ShortCode::new(code).map_err(|_| AppError::NotFound)?;

    let long_url = state
        .shortener()
        .resolve(&code)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(state.proxy().forward(&long_url, &headers).await?)
}

/// Proxies the request to the URL following `/proxy/`, query included.
pub async fn proxy_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response> {
    let target = uri
        .path_and_query()
        .map_or("", |pq| pq.as_str())
        .strip_prefix(PROXY_PREFIX)
        .unwrap_or_default();

    Ok(state.proxy().forward(target, &headers).await?)
}

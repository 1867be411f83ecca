use axum::extract::{OriginalUri, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use shorturl_core::{ShortCode, ShortenParams, RESERVED_PREFIX};
use tracing::{info, trace};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Serves every path without a dedicated route.
///
/// `/http…` shortens the rest of the request target (query included) and
/// answers with the short URL. Anything else is treated as a short code and
/// answered with a permanent redirect to its long URL.
pub async fn link_handler(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> Result<Response> {
    if method != Method::GET {
        return Err(AppError::MethodNotAllowed);
    }

    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let rest = target.strip_prefix('/').unwrap_or(target);

    if rest.starts_with(RESERVED_PREFIX) {
        shorten(&state, rest).await
    } else {
        redirect(&state, uri.path().trim_start_matches('/')).await
    }
}

async fn shorten(state: &AppState, long_url: &str) -> Result<Response> {
    let code = state
        .shortener()
        .shorten(ShortenParams {
            original_url: long_url.to_string(),
            ttl: state.default_ttl(),
        })
        .await?;

    Ok(code.to_url(state.base_url()).into_response())
}

async fn redirect(state: &AppState, raw_code: &str) -> Result<Response> {
    // never touch the store for something that cannot be a code
    let Ok(code) = ShortCode::new(raw_code) else {
        trace!(path = %raw_code, "not a short code");
        return Err(AppError::NotFound);
    };

    let long_url = state
        .shortener()
        .resolve(&code)
        .await?
        .ok_or(AppError::NotFound)?;

    let location = HeaderValue::try_from(long_url.as_str())
        .map_err(|e| AppError::InvalidRedirect(e.to_string()))?;

    info!(code = %code, url = %long_url, "redirecting");
    Ok((StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response())
}

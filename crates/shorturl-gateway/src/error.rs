use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shorturl_core::ShortenerError;
use thiserror::Error;
use tracing::{error, warn};

use crate::proxy::ProxyError;

pub type Result<T> = std::result::Result<T, AppError>;

/// Body of every not-found answer.
pub const NOT_FOUND_TEXT: &str = "short link not found or expired";
/// Body of the answer given when the store cannot be reached.
pub const STORE_UNAVAILABLE_TEXT: &str = "link storage is unavailable, please retry later";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("short link not found or expired")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("invalid redirect target: {0}")]
    InvalidRedirect(String),
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // unknown and expired links answer 200, not 404
            AppError::NotFound | AppError::Shortener(ShortenerError::InvalidShortCode(_)) => {
                (StatusCode::OK, NOT_FOUND_TEXT).into_response()
            }
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "method not allowed").into_response()
            }
            AppError::InvalidRedirect(message) => {
                error!(error = %message, "stored url cannot be used as a redirect target");
                (StatusCode::INTERNAL_SERVER_ERROR, "stored url is not a valid redirect target")
                    .into_response()
            }
            AppError::Shortener(ShortenerError::InvalidUrl(message)) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            AppError::Shortener(ShortenerError::Storage(source)) => {
                error!(error = %source, "storage failure");
                (StatusCode::SERVICE_UNAVAILABLE, STORE_UNAVAILABLE_TEXT).into_response()
            }
            AppError::Proxy(ProxyError::InvalidTarget { target, reason }) => (
                StatusCode::BAD_REQUEST,
                format!("invalid proxy target '{target}': {reason}"),
            )
                .into_response(),
            AppError::Proxy(ProxyError::Upstream(source)) => {
                warn!(error = %source, "upstream request failed");
                let status = if source.is_timeout() {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (status, "upstream request failed").into_response()
            }
        }
    }
}

//! HTTP gateway of the shorturl service.
//!
//! Routes requests to the [`Shortener`](shorturl_core::Shortener) and the
//! passthrough [`Proxy`](proxy::Proxy), and maps their errors to plain-text
//! responses.

pub mod app;
pub mod error;
pub mod handlers;
pub mod proxy;
pub mod state;

pub use app::App;
pub use error::AppError;
pub use proxy::{Proxy, ProxyError};
pub use state::AppState;

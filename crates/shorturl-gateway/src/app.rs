use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{index_handler, link_handler, proxy_handler, sub_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    /// Builds the router.
    ///
    /// `/http…` (shorten) and `/<code>` (redirect) share the fallback: a long
    /// URL spans several path segments, so no route pattern can capture it.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(index_handler))
            .route("/sub/{code}", get(sub_handler))
            .route("/proxy/{*target}", get(proxy_handler))
            .fallback(link_handler)
            .layer(CatchPanicLayer::new())
            .layer(CompressionLayer::new())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

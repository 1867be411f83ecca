use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::LOCATION;
use axum::http::{Method, Request, StatusCode, Uri};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use shorturl_core::store::Result as StoreResult;
use shorturl_core::{KeyTtl, KeyValueStore, Shortener, StorageError};
use shorturl_gateway::error::NOT_FOUND_TEXT;
use shorturl_gateway::{App, AppState, Proxy};
use shorturl_generator::RandomGenerator;
use shorturl_shortener::ShortenerService;
use shorturl_storage::InMemoryStore;
use tower::ServiceExt;

const DOMAIN: &str = "s.example.com";
const TTL: Duration = Duration::from_secs(180 * 24 * 60 * 60);

/// A store whose every call fails as if Redis were down.
struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn set_many(&self, _entries: &[(String, String)]) -> StoreResult<()> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> StoreResult<bool> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn ttl(&self, _key: &str) -> StoreResult<KeyTtl> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<bool> {
        Err(StorageError::Unavailable("connection refused".into()))
    }
}

fn app_with(shortener: Arc<dyn Shortener>) -> Router {
    let proxy = Proxy::new(Duration::from_secs(5)).unwrap();
    App::router(AppState::new(shortener, DOMAIN, TTL, proxy))
}

fn app() -> Router {
    app_with(Arc::new(ShortenerService::new(
        InMemoryStore::new(),
        RandomGenerator::new(),
    )))
}

async fn send(app: &Router, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn get_path(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri).await
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Shortens `long_url` through the HTTP surface and returns the short code.
async fn shorten(app: &Router, long_url: &str) -> String {
    let response = get_path(app, &format!("/{long_url}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let short_url = body_text(response).await;
    let code = short_url
        .strip_prefix(&format!("https://{DOMAIN}/"))
        .unwrap_or_else(|| panic!("unexpected short url {short_url}"));
    code.to_string()
}

/// Starts a local upstream that echoes the request target.
async fn start_upstream() -> String {
    async fn echo(uri: Uri) -> ([(&'static str, &'static str); 1], String) {
        ([("x-upstream", "yes")], format!("upstream saw {uri}"))
    }

    let router = Router::new().route("/echo", get(echo)).route(
        "/missing",
        get(|| async { (StatusCode::NOT_FOUND, "gone upstream") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn index_is_static_text() {
    let response = get_path(&app(), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "service temporarily unavailable");
}

#[tokio::test]
async fn shorten_returns_short_url_and_is_idempotent() {
    let app = app();

    let first = shorten(&app, "https://example.com/a/b?c=1").await;
    let second = shorten(&app, "https://example.com/a/b?c=1").await;
    let other = shorten(&app, "https://example.com/a/b?c=2").await;

    assert_eq!(first.len(), 6);
    assert!(first.bytes().all(|b| b.is_ascii_alphanumeric()));
    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[tokio::test]
async fn code_redirects_permanently() {
    let app = app();
    let code = shorten(&app, "https://example.com/a/b?c=1").await;

    let response = get_path(&app, &format!("/{code}")).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://example.com/a/b?c=1"
    );
}

#[tokio::test]
async fn unknown_code_answers_not_found_text() {
    let app = app();

    for path in ["/zzzzzz", "/favicon.ico", "/abc", "/sub/zzzzzz", "/sub/nope"] {
        let response = get_path(&app, path).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(body_text(response).await, NOT_FOUND_TEXT, "{path}");
    }
}

#[tokio::test]
async fn only_get_is_allowed() {
    let app = app();
    let code = shorten(&app, "https://example.com").await;

    for (method, path) in [
        (Method::POST, format!("/{code}")),
        (Method::DELETE, "/https://example.com".to_string()),
        (Method::POST, "/".to_string()),
        (Method::PUT, format!("/sub/{code}")),
    ] {
        let response = send(&app, method.clone(), &path).await;
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} {path}"
        );
    }
}

#[tokio::test]
async fn malformed_long_url_is_rejected() {
    let response = get_path(&app(), "/httpfoo").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn proxy_forwards_to_upstream() {
    let upstream = start_upstream().await;

    let response = get_path(&app(), &format!("/proxy/{upstream}/echo?name=a")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-upstream").unwrap(), "yes");
    assert_eq!(body_text(response).await, "upstream saw /echo?name=a");
}

#[tokio::test]
async fn proxy_passes_upstream_status_through() {
    let upstream = start_upstream().await;

    let response = get_path(&app(), &format!("/proxy/{upstream}/missing")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "gone upstream");
}

#[tokio::test]
async fn proxy_rejects_invalid_target() {
    let response = get_path(&app(), "/proxy/not-a-url").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    // nothing listens on port 1
    let response = get_path(&app(), "/proxy/http://127.0.0.1:1/").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn sub_resolves_then_proxies() {
    let upstream = start_upstream().await;
    let app = app();
    let code = shorten(&app, &format!("{upstream}/echo?from=sub")).await;

    let response = get_path(&app, &format!("/sub/{code}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "upstream saw /echo?from=sub");
}

#[tokio::test]
async fn store_failure_is_service_unavailable() {
    let app = app_with(Arc::new(ShortenerService::new(
        UnavailableStore,
        RandomGenerator::new(),
    )));

    for path in ["/abc123", "/https://example.com", "/sub/abc123"] {
        let response = get_path(&app, path).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{path}");
    }
}

mod cli;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use shorturl_core::Shortener;
use shorturl_gateway::{App, AppState, Proxy};
use shorturl_generator::RandomGenerator;
use shorturl_shortener::ShortenerService;
use shorturl_storage::{InMemoryStore, RedisStore};
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{StorageBackendArg, CLI};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CLI::parse();

    init_tracing(config.log_json);

    // the dsn may carry credentials, keep it out of the logs
    info!(
        port = config.port,
        domain = %config.domain,
        ttl_secs = config.ttl.as_secs(),
        storage_backend = %config.storage,
        "starting shorturl server"
    );

    let shortener: Arc<dyn Shortener> = match config.storage {
        StorageBackendArg::Redis => {
            let store = RedisStore::connect(&config.dsn).await?;
            Arc::new(ShortenerService::new(store, RandomGenerator::new()))
        }
        StorageBackendArg::InMemory => {
            let store = InMemoryStore::new();
            spawn_purge(store.clone());
            Arc::new(ShortenerService::new(store, RandomGenerator::new()))
        }
    };

    let proxy = Proxy::new(config.upstream_timeout)?;
    let state = AppState::new(shortener, &config.domain, config.ttl, proxy);

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Drops expired keys that are never read again.
fn spawn_purge(store: InMemoryStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                debug!(purged, "purged expired keys");
            }
        }
    });
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

//! Edge Cache - A caching reverse proxy for an origin content service
//!
//! Binary entry point: wires configuration, store, origin client, telemetry
//! and the HTTP server together.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_cache::api::{create_router, AppState};
use edge_cache::cache::{CacheAdapter, CacheStore, MemoryStore, RedisStore};
use edge_cache::metrics::EdgeStats;
use edge_cache::origin::OriginClient;
use edge_cache::telemetry::{TelemetryConfig, TelemetryEmitter};
use edge_cache::{spawn_cleanup_task, Config, EdgeProxy};

/// How long shutdown waits for queued telemetry to go out.
const TELEMETRY_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Main entry point for the edge cache proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to Redis, or create the in-process store and its expiry sweep
/// 4. Start the telemetry delivery worker
/// 5. Build the proxy core and the Axum router
/// 6. Serve until SIGINT/SIGTERM, then drain telemetry briefly
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edge_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Edge server {} starting on port {} in region {}",
        config.edge_id, config.server_port, config.region
    );
    info!("Origin URL: {}", config.origin_url);

    let stats = Arc::new(EdgeStats::with_identity(&config.identity()));

    let (store, cleanup_handle): (Arc<dyn CacheStore>, Option<JoinHandle<()>>) =
        match &config.redis_url {
            Some(url) => {
                let store = RedisStore::connect(url)
                    .await
                    .context("failed to connect to Redis")?;
                info!("Cache store initialized: Redis");
                (Arc::new(store), None)
            }
            None => {
                let store = Arc::new(MemoryStore::new(config.cache_max_entries));
                let handle = spawn_cleanup_task(store.clone(), config.cleanup_interval);
                info!(
                    "Cache store initialized: in-process, max_entries={}, cleanup_interval={}s",
                    config.cache_max_entries, config.cleanup_interval
                );
                (store, Some(handle))
            }
        };

    let (telemetry, telemetry_handle) = match TelemetryConfig::from_config(&config) {
        Some(telemetry_config) => {
            let (emitter, handle) = TelemetryEmitter::spawn(telemetry_config, stats.clone())
                .context("failed to start telemetry")?;
            (emitter, Some(handle))
        }
        None => {
            info!("Telemetry disabled");
            (TelemetryEmitter::disabled(stats.clone()), None)
        }
    };

    let origin = OriginClient::from_config(&config).context("failed to build origin client")?;
    let proxy = EdgeProxy::new(
        config.identity(),
        CacheAdapter::new(store),
        origin,
        stats,
        telemetry,
    )
    .with_query_in_key(config.include_query_in_key);

    let app = create_router(AppState::new(proxy));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cleanup_handle))
    .await
    .context("server error")?;

    // The router and every emitter clone are gone; the worker drains and exits
    if let Some(handle) = telemetry_handle {
        if tokio::time::timeout(TELEMETRY_DRAIN_TIMEOUT, handle).await.is_err() {
            warn!("Telemetry queue not drained before shutdown");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the expiry sweep if one runs and allows
/// graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Expiry sweep aborted");
    }
}

//! API Cache server
//!
//! Boots the cache engine with file persistence and serves the admin API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_cache::{
    create_router, spawn_sweep_task, ApiCache, AppState, Config, FilePersistence, HttpFetcher,
};

/// Main entry point for the API cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Hydrate the cache from its snapshot file
/// 4. Start background expiry sweep task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on the configured host and port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting API Cache Server");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: max_cache_size={}, default_ttl={}ms, host={}, port={}, sweep_interval={}s, cache_file={}, single_flight={}",
        config.max_cache_size,
        config.default_ttl_ms,
        config.server_host,
        config.server_port,
        config.sweep_interval,
        config.cache_file.display(),
        config.single_flight
    );

    let cache = ApiCache::init(
        config.cache_config(),
        Arc::new(FilePersistence::new(config.cache_file.clone())),
        Arc::new(HttpFetcher::new()),
    );
    info!("Cache initialized with {} entries", cache.len());

    // Start background sweep task
    let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(config.sweep_interval));
    info!("Background sweep task started");

    // Create router with all endpoints
    let app = create_router(AppState::new(cache));

    // Bind to configured address, loopback unless told otherwise
    let addr = SocketAddr::new(config.server_host, config.server_port);
    if !addr.ip().is_loopback() {
        warn!("Admin API has no auth and POST /fetch requests any URL; exposed on {}", addr);
    }
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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

    // Abort the sweep task
    sweep_handle.abort();
    warn!("Sweep task aborted");
}

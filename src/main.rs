//! GangGPT Cache - Unified cache layer for the game backend
//!
//! Runs the cache provider with its readiness and maintenance endpoints.

use std::net::SocketAddr;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ganggpt_cache::api::create_router;
use ganggpt_cache::{spawn_housekeeping_task, AppState, Config};

/// Main entry point for the cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Initialize the cache provider (Redis, or in-process fallback)
/// 4. Start temporary namespace housekeeping
/// 5. Serve the health/stats endpoints on the configured port
/// 6. On SIGINT/SIGTERM, stop background work and disconnect the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ganggpt_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GangGPT cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: redis_url={}, force_memory={}, port={}, temp_flush_interval={}s",
        config.redis_url, config.force_memory, config.server_port, config.temp_flush_interval
    );

    let state = AppState::from_config(&config);
    let backend = state.provider.initialize().await;
    info!("Cache provider ready using {} backend", backend);

    let housekeeping =
        spawn_housekeeping_task(state.provider.manager(), config.temp_flush_interval);

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(housekeeping))
        .await?;

    state.provider.disconnect().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the housekeeping task and allows graceful shutdown.
async fn shutdown_signal(housekeeping: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    if let Some(handle) = housekeeping {
        handle.abort();
        warn!("Housekeeping task aborted");
    }
}

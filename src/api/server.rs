use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{
    services::{download, get_info, health},
    state::AppState,
};
use crate::config::Config;
use crate::engine::{MediaEngine, YtDlpEngine};
use crate::retention::RetentionSweeper;
use crate::storage::StorageDir;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Version string reported when the engine cannot be queried.
const UNKNOWN_VERSION: &str = "unknown";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", post(get_info))
        .route("/download", post(download))
        .with_state(state)
        .layer(RequestDecompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

pub async fn run(address: Option<SocketAddr>) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;
    let address = address.unwrap_or(config.server.bind_addr);

    info!(path = %config.storage.download_dir.display(), "Preparing download directory");
    StorageDir::new(&config.storage.download_dir)
        .ensure()
        .map_err(|e| format!("Failed to create download directory: {}", e))?;

    let engine: Arc<dyn MediaEngine> = Arc::new(YtDlpEngine::new(&config.engine.binary));
    let engine_version = query_engine_version(Arc::clone(&engine)).await;
    let state = AppState::new(config, engine, engine_version);

    info!(
        engine_version = %state.engine_version,
        max_concurrent = state.config.limits.max_concurrent,
        max_duration_secs = state.config.limits.max_duration_secs,
        max_file_size_mb = state.config.limits.max_file_size_mb,
        "Engine ready"
    );

    let cancel = CancellationToken::new();
    let sweeper = RetentionSweeper::new(
        state.storage.path(),
        state.config.storage.retention(),
        state.config.storage.sweep_interval(),
        Arc::clone(&state.metrics),
    );
    let sweeper_handle = sweeper.spawn(cancel.clone());

    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "mediagate API listening");

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    if let Err(e) = sweeper_handle.await {
        warn!(error = %e, "Retention sweeper did not stop cleanly");
    }

    served?;
    Ok(())
}

async fn query_engine_version(engine: Arc<dyn MediaEngine>) -> String {
    match tokio::task::spawn_blocking(move || engine.version()).await {
        Ok(Ok(version)) => version,
        Ok(Err(e)) => {
            warn!(error = %e, "Could not query engine version");
            UNKNOWN_VERSION.to_string()
        }
        Err(e) => {
            warn!(error = %e, "Engine version task failed");
            UNKNOWN_VERSION.to_string()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

//! HTTP API for a saved bundle.
//!
//! `POST /predict` takes a JSON array of feature rows and answers with a
//! JSON array of labels. `GET /healthz` and `GET /metadata` report liveness
//! and the bundle description.
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;

use iris_classifier::bundle::{load_bundle, read_metadata};
use iris_classifier::{BundleMetadata, IrisClassifier};

pub mod routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IrisClassifier>,
    pub metadata: Arc<BundleMetadata>,
}

impl AppState {
    pub fn from_bundle<P: AsRef<Path>>(bundle_dir: P) -> Result<Self> {
        let dir = bundle_dir.as_ref();
        let service = load_bundle(dir)
            .with_context(|| format!("Failed to load bundle: {}", dir.display()))?;
        let metadata = read_metadata(dir)
            .with_context(|| format!("Failed to read bundle metadata: {}", dir.display()))?;
        Ok(AppState {
            service: Arc::new(service),
            metadata: Arc::new(metadata),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(routes::predict))
        .route("/healthz", get(routes::healthz))
        .route("/metadata", get(routes::metadata))
        .with_state(state)
}

/// Serve `state` on `addr` until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let name = state.service.name().to_string();
    let version = state.metadata.version.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Serving {}:{} on http://{}", name, version, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

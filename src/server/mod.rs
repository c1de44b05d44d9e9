//! HTTP front door: landing page, static assets and the download endpoint.

mod error;
mod routes;
mod static_files;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::{Config, ExtractionMode};
use crate::media::{Extractor, YtDlpExtractor};

/// Immutable per-process state shared by all requests.
#[derive(Clone)]
pub struct AppState {
    pub mode: ExtractionMode,
    pub extractor: Arc<dyn Extractor>,
}

impl AppState {
    pub fn new(mode: ExtractionMode, extractor: Arc<dyn Extractor>) -> Self {
        Self { mode, extractor }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.extraction.mode,
            Arc::new(YtDlpExtractor::from_config(&config.extraction)),
        )
    }
}

pub fn build_router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/", get(static_files::serve_index))
        .route("/static/*path", get(static_files::serve_static))
        .route("/download", post(routes::download))
        .route("/api/download", post(routes::download))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Router wired from configuration, shared by the server and the function adapter.
pub fn router_from_config(config: &Config) -> Router {
    build_router(AppState::from_config(config), config.server.cors)
}

pub async fn run(config: Config) -> Result<()> {
    let state = AppState::from_config(&config);

    match state.mode {
        ExtractionMode::Delegated => {
            if !state.extractor.test_availability().await {
                warn!(
                    "{} is not available, extraction requests will fail",
                    state.extractor.name()
                );
            }
        }
        ExtractionMode::Stub => {
            warn!("Running in stub mode, /download returns a canned payload");
        }
    }

    let app = build_router(state, config.server.cors);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

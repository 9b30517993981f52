//! HTTP server wiring.
//!
//! The application state is built once from the resolved configuration and
//! shared read-only between requests; every request loads its own dataset.

mod handlers;

use crate::charts::ChartSettings;
use crate::config::{Config, DashboardConfig};
use crate::error::DashboardError;
use crate::loader::{DatasetLoader, LoaderConfig};
use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Process-wide state shared by all routes.
#[derive(Debug, Clone)]
pub struct AppState {
    pub loader: DatasetLoader,
    pub charts: ChartSettings,
    pub dashboard: DashboardConfig,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            loader: DatasetLoader::new(LoaderConfig::from(&config.data)),
            charts: ChartSettings::from(&config.charts),
            dashboard: config.dashboard.clone(),
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/search", get(handlers::search_handler))
        .route("/directors", get(handlers::directors_handler))
        .route("/genres", get(handlers::genres_handler))
        .route("/api/stats", get(handlers::api_stats_handler))
        .route("/api/movies", get(handlers::api_movies_handler))
        .route("/api/genres", get(handlers::api_genres_handler))
        .route("/api/directors", get(handlers::api_directors_handler))
        .with_state(Arc::new(state))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let app = build_router(AppState::from_config(config));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

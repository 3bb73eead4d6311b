//! REST API implementation

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Query as QueryParams, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use stirling_common::config::ServerConfig;
use stirling_common::error::Result;
use stirling_common::metrics;
use stirling_fixes::{FixBatch, FixFeed};
use stirling_store::TimeBound;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;

/// REST API server
#[derive(Clone)]
pub struct RestServer {
    config: ServerConfig,
    feed: Arc<FixFeed>,
}

impl RestServer {
    /// Create a new REST server
    #[must_use]
    pub fn new(config: &ServerConfig, feed: FixFeed) -> Self {
        Self {
            config: config.clone(),
            feed: Arc::new(feed),
        }
    }

    /// Build CORS middleware based on configuration
    fn build_cors(origins: &[String]) -> CorsLayer {
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            return CorsLayer::permissive();
        }

        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring unparsable CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/metrics", get(export_metrics))
            .route("/api/fixes", get(list_fixes))
            .with_state(self.feed.clone())
            .fallback_service(ServeDir::new(&self.config.static_dir))
            .layer(Self::build_cors(&self.config.cors_origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&address).await?;

        info!("Starting REST API server on {}", address);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("REST API server stopped");
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn export_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics::export_prometheus(),
    )
}

#[derive(Debug, Deserialize)]
struct FixesParams {
    since: Option<String>,
    before: Option<String>,
}

async fn list_fixes(
    State(feed): State<Arc<FixFeed>>,
    QueryParams(params): QueryParams<FixesParams>,
) -> std::result::Result<Json<FixBatch>, ApiError> {
    let bound = TimeBound::from_params(params.since, params.before)?;

    match feed.fixes(bound).await {
        Ok(fixes) => {
            info!("/api/fixes returned {} items", fixes.len());
            metrics::record_fix_request(true, fixes.len());
            Ok(Json(FixBatch::from(fixes)))
        }
        Err(e) => {
            metrics::record_fix_request(false, 0);
            Err(e.into())
        }
    }
}

//! Tile worker service.
//!
//! Renders one region per request with the escape-time kernel and answers
//! with a PNG. The director fans a render out over many of these.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use render_common::error::NOT_FOUND_BODY;
use render_common::{Region, RenderError, RenderResult};
use renderer::{escape_time, png};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

pub struct WorkerState {
    pub max_iter: u32,
    pub prometheus: Option<PrometheusHandle>,
}

impl WorkerState {
    pub fn new(max_iter: u32) -> Self {
        Self {
            max_iter,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

fn text_response(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

/// Render `region` and encode it, off the async executor.
pub async fn render_tile(region: Region, max_iter: u32) -> RenderResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || {
        let canvas = escape_time::render_region(&region, max_iter)?;
        png::encode_canvas(&canvas).map_err(|e| RenderError::Internal(e.to_string()))
    })
    .await
    .map_err(|e| RenderError::Internal(format!("Render task failed: {}", e)))?
}

/// GET /{width}/{height}/{re0}/{im0}/{re1}/{im1}
async fn tile_handler(Extension(state): Extension<Arc<WorkerState>>, uri: Uri) -> Response {
    let region = match Region::from_path(uri.path()) {
        Ok(region) => region,
        Err(e) => {
            debug!(path = %uri.path(), error = %e, "Rejected tile target");
            counter!("worker_tiles_total", "outcome" => "rejected").increment(1);
            return text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY);
        }
    };

    match render_tile(region, state.max_iter).await {
        Ok(bytes) => {
            counter!("worker_tiles_total", "outcome" => "rendered").increment(1);
            info!(
                width = region.width,
                height = region.height,
                bytes = bytes.len(),
                "Tile rendered"
            );
            (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], bytes).into_response()
        }
        Err(e) => {
            counter!("worker_tiles_total", "outcome" => "failed").increment(1);
            error!(path = %uri.path(), error = %e, "Tile render failed");
            let status = StatusCode::from_u16(e.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            text_response(status, e.public_message())
        }
    }
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "worker".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics
async fn metrics_handler(Extension(state): Extension<Arc<WorkerState>>) -> impl IntoResponse {
    state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

async fn not_found_handler() -> Response {
    text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// Build the HTTP router.
pub fn build_router(state: Arc<WorkerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/*target", get(tile_handler).fallback(not_found_handler))
        .fallback(not_found_handler)
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server.
pub async fn start_server(state: Arc<WorkerState>, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port = port, "Starting worker HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use render_common::error::NOT_FOUND_BODY;
use render_common::{Region, RenderError, RenderResult};
use serde::Serialize;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::artifact;
use crate::metrics::{record_rejected, record_render};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Plain-text error response.
pub fn text_response(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

fn error_response(err: &RenderError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    text_response(status, err.public_message())
}

/// GET /{width}/{height}/{re0}/{im0}/{re1}/{im1}
pub async fn render_handler(Extension(state): Extension<Arc<AppState>>, uri: Uri) -> Response {
    let request_id = Uuid::new_v4();
    let path = uri.path().to_string();

    let region = match Region::from_path(&path) {
        Ok(region) => region,
        Err(e) => {
            info!(request_id = %request_id, path = %path, error = %e, "Rejected render target");
            record_rejected(404);
            return text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY);
        }
    };

    let span = tracing::info_span!("render", request_id = %request_id, path = %path);
    match render(&state, region).instrument(span).await {
        Ok(bytes) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Render failed");
            record_rejected(e.http_status_code());
            error_response(&e)
        }
    }
}

async fn render(state: &AppState, region: Region) -> RenderResult<Vec<u8>> {
    info!(
        width = region.width,
        height = region.height,
        grid = %state.orchestrator.grid(),
        "Render requested"
    );

    let (canvas, report) = state.orchestrator.render(&region).await?;
    record_render(&report);
    if report.failed > 0 {
        warn!(
            failed = report.failed,
            tiles = report.tiles,
            "Image has background-filled tiles"
        );
    }

    let mode = state.artifact_mode;
    tokio::task::spawn_blocking(move || artifact::produce(&canvas, mode))
        .await
        .map_err(|e| RenderError::Internal(format!("Artifact task failed: {}", e)))?
}

/// GET /health
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "director".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

/// Anything that is not a GET on a known route.
pub async fn not_found_handler() -> Response {
    text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

//! Worker HTTP tests.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use render_common::{Region, Rgb};
use renderer::escape_time::render_region;
use renderer::png;
use test_utils::{assert_rect_color, paths};
use tower::ServiceExt;
use worker::{build_router, WorkerState};

async fn get(uri: &str, max_iter: u32) -> (StatusCode, Option<String>, Vec<u8>) {
    let app = build_router(Arc::new(WorkerState::new(max_iter)));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_tile_matches_kernel() {
    let (status, content_type, body) = get(paths::SEAHORSE, 100).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    let expected = render_region(&Region::from_path(paths::SEAHORSE).unwrap(), 100).unwrap();
    assert_eq!(png::decode_rgb(&body).unwrap(), expected);
}

#[tokio::test]
async fn test_region_outside_set_is_white() {
    // Every sample has |c| > 2, so it escapes before the first iteration counts
    let (status, _, body) = get("/5/4/3/3/4/4", 100).await;

    assert_eq!(status, StatusCode::OK);
    let canvas = png::decode_rgb(&body).unwrap();
    assert_eq!((canvas.width(), canvas.height()), (5, 4));
    assert_rect_color!(canvas.as_bytes(), 5, (0, 0, 5, 4), Rgb::new(253, 253, 253));
}

#[tokio::test]
async fn test_malformed_targets_are_not_found() {
    for path in paths::MALFORMED {
        let (status, _, body) = get(path, 100).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "path {}", path);
        assert_eq!(body, b"not found");
    }
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get("/health", 100).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["service"], "worker");
}

//! Orchestration tests against a scripted worker pool.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use common::{orchestrator, Script, ScriptedFetcher};
use director::orchestrator::settle_all;
use director::{Orchestrator, TileFetcher, TileRequest, TransportError, UnitState};
use futures::channel::oneshot;
use futures::FutureExt;
use render_common::{GridShape, Region, Rgb};
use renderer::Canvas;
use tokio_test::{assert_pending, assert_ready, task};
use test_utils::{
    assert_approx_eq, assert_rect_color, corrupt_png, gray_tile_png, paths, pattern_pixels, pattern_tile_png,
    rgba_tile_png, solid_tile_png,
};

const RED: Rgb = Rgb::new(255, 0, 0);
const GREEN: Rgb = Rgb::new(0, 255, 0);
const BLUE: Rgb = Rgb::new(0, 0, 255);

fn tiny() -> Region {
    Region::from_path(paths::TINY_2X2).unwrap()
}

#[tokio::test]
async fn test_2x2_grid_requests_and_placement() {
    let fetcher = ScriptedFetcher::new(vec![
        Script::Body(solid_tile_png(2, 2, RED)),
        Script::Body(solid_tile_png(2, 2, GREEN)),
        Script::Body(solid_tile_png(2, 2, BLUE)),
        Script::Body(solid_tile_png(2, 2, Rgb::BLACK)),
    ]);
    let orch = orchestrator(fetcher.clone(), 2, 2, Rgb::WHITE);

    let (canvas, report) = orch.render(&tiny()).await.unwrap();

    assert_eq!(
        fetcher.urls(),
        vec![
            "http://worker0:8000/2/2/-2.0/-1.0/-0.5/0.0",
            "http://worker1:8000/2/2/-0.5/-1.0/1.0/0.0",
            "http://worker2:8000/2/2/-2.0/0.0/-0.5/1.0",
            "http://worker3:8000/2/2/-0.5/0.0/1.0/1.0",
        ]
    );
    assert_eq!(report.tiles, 4);
    assert_eq!(report.completed, 4);
    assert_eq!(report.failed, 0);

    let pixels = canvas.as_bytes();
    assert_rect_color!(pixels, 4, (0, 0, 2, 2), RED);
    assert_rect_color!(pixels, 4, (2, 0, 2, 2), GREEN);
    assert_rect_color!(pixels, 4, (0, 2, 2, 2), BLUE);
    assert_rect_color!(pixels, 4, (2, 2, 2, 2), Rgb::BLACK);
}

#[tokio::test]
async fn test_all_tiles_failing_yields_background() {
    let fetcher = ScriptedFetcher::new(vec![Script::Status(500); 4]);
    let orch = orchestrator(fetcher, 2, 2, Rgb::WHITE);

    let (canvas, report) = orch.render(&tiny()).await.unwrap();

    assert_eq!(report.completed, 0);
    assert_eq!(report.failed, 4);
    assert_eq!((canvas.width(), canvas.height()), (4, 4));
    assert_rect_color!(canvas.as_bytes(), 4, (0, 0, 4, 4), Rgb::WHITE);
}

#[tokio::test]
async fn test_refused_dispatch_leaves_cell_background() {
    let fetcher = ScriptedFetcher::new(vec![
        Script::Body(solid_tile_png(2, 2, RED)),
        Script::Refuse,
        Script::Body(solid_tile_png(2, 2, RED)),
        Script::Body(solid_tile_png(2, 2, RED)),
    ]);
    let orch = orchestrator(fetcher, 2, 2, Rgb::WHITE);

    let (canvas, report) = orch.render(&tiny()).await.unwrap();

    assert_eq!(report.undispatched, 1);
    assert_eq!(report.completed, 3);
    let pixels = canvas.as_bytes();
    assert_rect_color!(pixels, 4, (2, 0, 2, 2), Rgb::WHITE);
    assert_rect_color!(pixels, 4, (0, 2, 4, 2), RED);
}

#[tokio::test]
async fn test_invalid_tile_bodies_are_rejected() {
    let fetcher = ScriptedFetcher::new(vec![
        Script::Body(rgba_tile_png(2, 2)),
        Script::Body(gray_tile_png(2, 2)),
        Script::Body(solid_tile_png(3, 2, RED)),
        Script::Body(corrupt_png()),
    ]);
    let orch = orchestrator(fetcher, 2, 2, Rgb::BLACK);

    let (canvas, report) = orch.render(&tiny()).await.unwrap();

    assert_eq!(report.failed, 4);
    assert_rect_color!(canvas.as_bytes(), 4, (0, 0, 4, 4), Rgb::BLACK);
}

#[tokio::test]
async fn test_completion_order_does_not_change_image() {
    let region = Region::from_path("/8/6/-2/-1/1/1").unwrap();
    let tiles: Vec<Vec<u8>> = (0..4).map(|i| pattern_tile_png(4, 3, i * 40)).collect();

    let in_order = ScriptedFetcher::new(tiles.iter().cloned().map(Script::Body).collect());
    let reversed = ScriptedFetcher::new(
        tiles
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, body)| Script::Delayed(Duration::from_millis(40 - i as u64 * 10), body))
            .collect(),
    );

    let (expected, _) = orchestrator(in_order, 2, 2, Rgb::WHITE)
        .render(&region)
        .await
        .unwrap();
    let (actual, report) = orchestrator(reversed, 2, 2, Rgb::WHITE)
        .render(&region)
        .await
        .unwrap();

    assert_eq!(report.completed, 4);
    assert!(report.sweeps > 1);
    assert_eq!(actual, expected);

    // Top-right tile starts at canvas x = 4 and keeps its own pattern
    let row = &actual.as_bytes()[..8 * 3];
    assert_eq!(&row[4 * 3..], &pattern_pixels(4, 1, 40)[..]);
}

#[tokio::test]
async fn test_slow_failure_does_not_block_other_tiles() {
    let fetcher = ScriptedFetcher::new(vec![
        Script::FailAfter(Duration::from_millis(30)),
        Script::Delayed(Duration::from_millis(5), solid_tile_png(2, 2, GREEN)),
        Script::Body(solid_tile_png(2, 2, GREEN)),
        Script::Status(503),
    ]);
    let orch = orchestrator(fetcher, 2, 2, Rgb::WHITE);

    let (canvas, report) = orch.render(&tiny()).await.unwrap();

    assert_eq!(report.completed, 2);
    assert_eq!(report.failed, 2);
    let pixels = canvas.as_bytes();
    assert_rect_color!(pixels, 4, (0, 0, 2, 2), Rgb::WHITE);
    assert_rect_color!(pixels, 4, (2, 0, 2, 2), GREEN);
    assert_rect_color!(pixels, 4, (0, 2, 2, 2), GREEN);
    assert_rect_color!(pixels, 4, (2, 2, 2, 2), Rgb::WHITE);
}

#[tokio::test]
async fn test_remainder_strip_keeps_background() {
    // 31x20 over 3x3 gives 10x6 tiles; column 30 and rows 18..20 are never covered
    let region = Region::from_path(paths::UNEVEN).unwrap();
    let fetcher = ScriptedFetcher::new(vec![Script::Body(solid_tile_png(10, 6, Rgb::BLACK)); 9]);
    let orch = orchestrator(fetcher.clone(), 3, 3, Rgb::WHITE);

    let (canvas, report) = orch.render(&region).await.unwrap();

    assert_eq!(report.completed, 9);
    assert!(fetcher.urls().iter().all(|url| url.contains(":8000/10/6/")));
    let pixels = canvas.as_bytes();
    assert_rect_color!(pixels, 31, (0, 0, 30, 18), Rgb::BLACK);
    assert_rect_color!(pixels, 31, (30, 0, 1, 20), Rgb::WHITE);
    assert_rect_color!(pixels, 31, (0, 18, 31, 2), Rgb::WHITE);
}

#[test]
fn test_thirds_cover_outer_bounds() {
    let region = Region::from_path("/9/9/-2/-1/1/1").unwrap();
    let fetcher = ScriptedFetcher::new(vec![]);
    let units = orchestrator(fetcher, 3, 3, Rgb::WHITE).dispatch(&region);

    let first = units[0].cell();
    let last = units[8].cell();
    assert_approx_eq!(first.start_re, -2.0, 1e-12);
    assert_approx_eq!(first.end_im - first.start_im, 2.0 / 3.0, 1e-12);
    assert_approx_eq!(last.end_re, 1.0, 1e-12);
    assert_approx_eq!(last.end_im, 1.0, 1e-12);
    assert_eq!((last.pixel_x, last.pixel_y), (6, 6));
}

#[tokio::test]
async fn test_grid_finer_than_image_dispatches_nothing() {
    let region = Region::from_path("/2/2/-2/-1/1/1").unwrap();
    let fetcher = ScriptedFetcher::new(vec![]);
    let orch = orchestrator(fetcher.clone(), 3, 3, Rgb::WHITE);

    let (canvas, report) = orch.render(&region).await.unwrap();

    assert!(fetcher.urls().is_empty());
    assert_eq!(report.undispatched, 9);
    assert_eq!(report.failed, 9);
    assert_rect_color!(canvas.as_bytes(), 2, (0, 0, 2, 2), Rgb::WHITE);
}

#[tokio::test]
async fn test_units_settle_exactly_once() {
    let fetcher = ScriptedFetcher::new(vec![
        Script::Body(solid_tile_png(2, 2, RED)),
        Script::Status(404),
        Script::Refuse,
        Script::Delayed(Duration::from_millis(5), solid_tile_png(2, 2, RED)),
    ]);
    let orch = orchestrator(fetcher, 2, 2, Rgb::WHITE);
    let mut canvas = Canvas::allocate(4, 4).unwrap();

    let mut units = orch.dispatch(&tiny());
    assert_eq!(units[2].state(), UnitState::Failed);
    settle_all(&mut units, &mut canvas).await;

    let states: Vec<UnitState> = units.iter().map(|u| u.state()).collect();
    assert_eq!(
        states,
        vec![
            UnitState::Completed,
            UnitState::Failed,
            UnitState::Failed,
            UnitState::Completed
        ]
    );
    assert!(units.iter().all(|u| !u.has_request()));
}

/// Fetcher whose single request completes when the test sends a body.
struct ChannelFetcher(Mutex<Option<oneshot::Receiver<Bytes>>>);

impl TileFetcher for ChannelFetcher {
    fn dispatch(&self, _url: &str) -> Result<TileRequest, TransportError> {
        let rx = self
            .0
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| TransportError::Request("channel already taken".to_string()))?;
        Ok(async move {
            rx.await
                .map_err(|_| TransportError::Request("sender dropped".to_string()))
        }
        .boxed())
    }
}

#[test]
fn test_sweep_runs_again_only_after_wakeup() {
    let (tx, rx) = oneshot::channel();
    let orch = Orchestrator::new(
        Arc::new(ChannelFetcher(Mutex::new(Some(rx)))),
        common::named_endpoint(),
        GridShape::single(),
        Rgb::WHITE,
    );
    let region = Region::from_path("/2/2/-2/-1/1/1").unwrap();
    let mut canvas = Canvas::allocate(2, 2).unwrap();
    let mut units = orch.dispatch(&region);

    {
        let mut settle = task::spawn(settle_all(&mut units, &mut canvas));
        assert_pending!(settle.poll());
        assert!(!settle.is_woken());

        tx.send(Bytes::from(solid_tile_png(2, 2, RED))).unwrap();
        assert!(settle.is_woken());
        let sweeps = assert_ready!(settle.poll());
        assert_eq!(sweeps, 2);
    }

    assert_eq!(units[0].state(), UnitState::Completed);
    assert_rect_color!(canvas.as_bytes(), 2, (0, 0, 2, 2), RED);
}

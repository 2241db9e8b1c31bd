//! Scatter/gather orchestration of one render request.
//!
//! The outer region is split into a fixed grid. Every cell becomes a
//! [`WorkUnit`] with its own outbound request; all requests are issued up
//! front, then a single task sweeps the units until each one has settled,
//! merging finished tiles into the canvas as they arrive.
//!
//! ## Unit lifecycle
//!
//! ```text
//! Pending ──(tile decoded and merged)──▶ Completed
//!    │
//!    └──(dispatch, transport, status, decode or size failure)──▶ Failed
//! ```
//!
//! Both terminal states are final: nothing is retried. A failed cell keeps
//! the background color.

use std::future::{poll_fn, Future};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use render_common::{partition, GridShape, Region, RenderResult, Rgb, TileCell};
use renderer::Canvas;
use tracing::{debug, info, warn};

use crate::config::WorkerEndpoint;
use crate::fetcher::{TileFetcher, TileRequest};
use crate::merge::merge_tile;

/// Settlement state of a work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    Pending,
    Completed,
    Failed,
}

impl UnitState {
    pub fn is_terminal(self) -> bool {
        self != UnitState::Pending
    }
}

/// One grid cell and its outbound request.
pub struct WorkUnit {
    cell: TileCell,
    request: Option<TileRequest>,
    state: UnitState,
}

impl WorkUnit {
    fn new(cell: TileCell) -> Self {
        Self {
            cell,
            request: None,
            state: UnitState::Pending,
        }
    }

    pub fn cell(&self) -> &TileCell {
        &self.cell
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Whether the unit still holds a live request handle.
    pub fn has_request(&self) -> bool {
        self.request.is_some()
    }

    fn settle(&mut self, state: UnitState) {
        debug_assert!(!self.state.is_terminal(), "work unit settled twice");
        self.state = state;
        self.request = None;
    }

    /// Advance the request by one non-blocking step.
    ///
    /// Returns `Poll::Ready` once the unit is terminal. A successful response
    /// is merged into `canvas` before this returns.
    fn poll_settle(&mut self, cx: &mut Context<'_>, canvas: &mut Canvas) -> Poll<UnitState> {
        if self.state.is_terminal() {
            return Poll::Ready(self.state);
        }
        let Some(request) = self.request.as_mut() else {
            // A pending unit without a handle can never make progress
            self.settle(UnitState::Failed);
            return Poll::Ready(self.state);
        };

        let outcome = match request.as_mut().poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(outcome) => outcome,
        };

        let cell = self.cell;
        let state = match outcome {
            Ok(body) => match merge_tile(canvas, &cell, &body) {
                Ok(()) => {
                    debug!(tile = cell.index, bytes = body.len(), "Tile merged");
                    UnitState::Completed
                }
                Err(e) => {
                    warn!(tile = cell.index, row = cell.row, col = cell.col, error = %e, "Tile merge failed");
                    UnitState::Failed
                }
            },
            Err(e) => {
                warn!(tile = cell.index, row = cell.row, col = cell.col, error = %e, "Tile request failed");
                UnitState::Failed
            }
        };
        self.settle(state);
        Poll::Ready(state)
    }
}

impl std::fmt::Debug for WorkUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkUnit")
            .field("cell", &self.cell)
            .field("state", &self.state)
            .field("has_request", &self.request.is_some())
            .finish()
    }
}

/// Outcome counts of one orchestration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub tiles: usize,
    pub completed: usize,
    pub failed: usize,
    /// Units that never obtained a request handle
    pub undispatched: usize,
    /// Number of sweeps the poll loop ran
    pub sweeps: usize,
    pub elapsed: Duration,
}

/// Splits render requests across the worker grid and assembles the result.
#[derive(Clone)]
pub struct Orchestrator {
    fetcher: Arc<dyn TileFetcher>,
    endpoint: WorkerEndpoint,
    grid: GridShape,
    background: Rgb,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn TileFetcher>,
        endpoint: WorkerEndpoint,
        grid: GridShape,
        background: Rgb,
    ) -> Self {
        Self {
            fetcher,
            endpoint,
            grid,
            background,
        }
    }

    pub fn grid(&self) -> GridShape {
        self.grid
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    /// Render `region` by scattering it across the worker grid.
    ///
    /// Only canvas allocation can fail; per-tile failures are absorbed and
    /// counted in the report.
    pub async fn render(&self, region: &Region) -> RenderResult<(Canvas, RenderReport)> {
        let started = Instant::now();

        let mut canvas = Canvas::allocate(region.width as usize, region.height as usize)?;
        canvas.fill(self.background);

        let mut units = self.dispatch(region);
        let undispatched = units.iter().filter(|u| u.state().is_terminal()).count();
        let sweeps = settle_all(&mut units, &mut canvas).await;

        let completed = units
            .iter()
            .filter(|u| u.state() == UnitState::Completed)
            .count();
        let report = RenderReport {
            tiles: units.len(),
            completed,
            failed: units.len() - completed,
            undispatched,
            sweeps,
            elapsed: started.elapsed(),
        };
        // Releases any handle still held
        drop(units);

        info!(
            width = region.width,
            height = region.height,
            grid = %self.grid,
            completed = report.completed,
            failed = report.failed,
            sweeps = report.sweeps,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Render assembled"
        );

        Ok((canvas, report))
    }

    /// Create one unit per grid cell and issue its request.
    ///
    /// Cells that cannot be requested (no pixels, or the fetcher refuses the
    /// URL) are marked failed immediately so the poll loop never waits on them.
    pub fn dispatch(&self, region: &Region) -> Vec<WorkUnit> {
        partition(region, self.grid)
            .into_iter()
            .map(|cell| {
                let mut unit = WorkUnit::new(cell);
                let sub_region = match cell.region() {
                    Ok(sub_region) => sub_region,
                    Err(e) => {
                        warn!(tile = cell.index, error = %e, "Tile has no pixels, not dispatched");
                        unit.settle(UnitState::Failed);
                        return unit;
                    }
                };

                let url = self.endpoint.tile_url(cell.index, &sub_region);
                debug!(tile = cell.index, url = %url, "Dispatching tile request");
                match self.fetcher.dispatch(&url) {
                    Ok(request) => unit.request = Some(request),
                    Err(e) => {
                        warn!(tile = cell.index, error = %e, "Tile request could not be issued");
                        unit.settle(UnitState::Failed);
                    }
                }
                unit
            })
            .collect()
    }
}

/// Drive every pending unit until all of them are terminal.
///
/// Each wakeup runs one sweep that polls every pending unit once, in order.
/// Completed tiles are merged inside the sweep, before the next unit is
/// polled. Returns the number of sweeps performed.
pub async fn settle_all(units: &mut [WorkUnit], canvas: &mut Canvas) -> usize {
    let mut sweeps = 0;
    poll_fn(|cx| {
        sweeps += 1;
        let mut pending = 0;
        let mut transitions = 0;

        for unit in units.iter_mut() {
            if unit.state().is_terminal() {
                continue;
            }
            match unit.poll_settle(cx, canvas) {
                Poll::Pending => pending += 1,
                Poll::Ready(_) => transitions += 1,
            }
        }

        if transitions > 0 {
            let completed = units
                .iter()
                .filter(|u| u.state() == UnitState::Completed)
                .count();
            debug!(
                pending,
                completed,
                failed = units.len() - pending - completed,
                "Sweep settled units"
            );
        }

        if pending == 0 {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    })
    .await;
    sweeps
}

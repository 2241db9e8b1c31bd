//! Tiled render director.
//!
//! Accepts `GET /{width}/{height}/{re0}/{im0}/{re1}/{im1}`, splits the region
//! into a grid of tiles, fetches every tile from a worker concurrently and
//! answers with the assembled PNG. Tiles that fail keep the background color.

pub mod artifact;
pub mod config;
pub mod fetcher;
pub mod handlers;
pub mod merge;
pub mod metrics;
pub mod orchestrator;
pub mod server;
pub mod state;

pub use config::{Args, DirectorConfig, WorkerEndpoint};
pub use fetcher::{HttpFetcher, TileFetcher, TileRequest, TransportError};
pub use orchestrator::{Orchestrator, RenderReport, UnitState, WorkUnit};
pub use server::{build_router, start_server};
pub use state::AppState;

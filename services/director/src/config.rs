//! Director configuration.

use std::time::Duration;

use clap::Parser;
use render_common::{GridShape, Region, Rgb};
use thiserror::Error;

use crate::artifact::ArtifactMode;

/// Command-line and environment settings of the director.
#[derive(Parser, Debug, Clone)]
#[command(name = "director")]
#[command(about = "Tiled Mandelbrot render director")]
pub struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 9000)]
    pub port: u16,

    /// Host name prefix of worker instances; tile N goes to `{base}{N}`
    #[arg(long, env = "WORKER_BASE_NAME", default_value = "worker")]
    pub worker_base_name: String,

    /// Port every worker listens on
    #[arg(long, env = "WORKER_PORT", default_value_t = 8000)]
    pub worker_port: u16,

    /// Send every tile to this single worker instead (e.g. http://127.0.0.1:8000)
    #[arg(long, env = "WORKER_URL")]
    pub worker_url: Option<String>,

    /// Number of tile rows
    #[arg(long, env = "GRID_ROWS", default_value_t = 3)]
    pub grid_rows: u32,

    /// Number of tile columns
    #[arg(long, env = "GRID_COLS", default_value_t = 3)]
    pub grid_cols: u32,

    /// Color of tiles that fail ("r,g,b" or "#rrggbb")
    #[arg(long, env = "BACKGROUND", default_value = "255,255,255")]
    pub background: String,

    /// Give up on a tile request after this many seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 240)]
    pub request_timeout_secs: u64,

    /// Write the final image to a temporary file before responding
    #[arg(long, env = "SPOOL_TO_DISK", default_value_t = false)]
    pub spool_to_disk: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long)]
    pub worker_threads: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: u32, cols: u32 },

    #[error("Invalid background color: {0}")]
    Background(#[from] render_common::ColorParseError),

    #[error("Request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Where tile requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEndpoint {
    /// One worker per tile, reachable as `http://{base_name}{index}:{port}`
    Named { base_name: String, port: u16 },
    /// Every tile goes to the same base URL
    Fixed(String),
}

impl WorkerEndpoint {
    /// Base URL of the worker responsible for tile `index`.
    pub fn base_url(&self, index: usize) -> String {
        match self {
            WorkerEndpoint::Named { base_name, port } => {
                format!("http://{}{}:{}", base_name, index, port)
            }
            WorkerEndpoint::Fixed(url) => url.trim_end_matches('/').to_string(),
        }
    }

    /// Full request URL for rendering `region` as tile `index`.
    pub fn tile_url(&self, index: usize, region: &Region) -> String {
        format!("{}{}", self.base_url(index), region.to_path())
    }
}

/// Validated director settings.
#[derive(Debug, Clone)]
pub struct DirectorConfig {
    pub port: u16,
    pub endpoint: WorkerEndpoint,
    pub grid: GridShape,
    pub background: Rgb,
    pub request_timeout: Duration,
    pub artifact_mode: ArtifactMode,
}

impl DirectorConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let grid = GridShape::new(args.grid_rows, args.grid_cols).ok_or(ConfigError::EmptyGrid {
            rows: args.grid_rows,
            cols: args.grid_cols,
        })?;
        if args.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let endpoint = match &args.worker_url {
            Some(url) => WorkerEndpoint::Fixed(url.clone()),
            None => WorkerEndpoint::Named {
                base_name: args.worker_base_name.clone(),
                port: args.worker_port,
            },
        };

        let artifact_mode = if args.spool_to_disk {
            ArtifactMode::Spool
        } else {
            ArtifactMode::InMemory
        };

        Ok(Self {
            port: args.port,
            endpoint,
            grid,
            background: args.background.parse()?,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            artifact_mode,
        })
    }
}

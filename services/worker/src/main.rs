//! Worker service entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use renderer::escape_time::DEFAULT_MAX_ITER;
use worker::{start_server, WorkerState};

#[derive(Parser, Debug)]
#[command(name = "worker")]
#[command(about = "Mandelbrot tile worker")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Iteration budget per pixel
    #[arg(long, env = "MAX_ITER", default_value_t = DEFAULT_MAX_ITER)]
    max_iter: u32,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!(port = args.port, max_iter = args.max_iter, "Starting worker");

    let state = WorkerState::new(args.max_iter).with_prometheus(prometheus_handle);
    start_server(Arc::new(state), args.port).await
}

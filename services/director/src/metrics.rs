//! Prometheus metrics recorded by the director.

use metrics::{counter, histogram};

use crate::orchestrator::RenderReport;

/// Record the outcome of one orchestration pass.
pub fn record_render(report: &RenderReport) {
    counter!("director_renders_total").increment(1);
    counter!("director_tiles_total", "outcome" => "completed").increment(report.completed as u64);
    counter!("director_tiles_total", "outcome" => "failed").increment(report.failed as u64);
    histogram!("director_render_duration_seconds").record(report.elapsed.as_secs_f64());
}

/// Record a request rejected before any tile was dispatched.
pub fn record_rejected(status: u16) {
    counter!("director_rejected_total", "status" => status.to_string()).increment(1);
}

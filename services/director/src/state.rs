//! Application state shared by the request handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::artifact::ArtifactMode;
use crate::config::DirectorConfig;
use crate::fetcher::{HttpFetcher, TileFetcher};
use crate::orchestrator::Orchestrator;

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub artifact_mode: ArtifactMode,
    /// Absent when no recorder was installed (tests)
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state around the real HTTP fetcher.
    pub fn new(config: &DirectorConfig, prometheus: Option<PrometheusHandle>) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(config.request_timeout)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher), prometheus))
    }

    pub fn with_fetcher(
        config: &DirectorConfig,
        fetcher: Arc<dyn TileFetcher>,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(
                fetcher,
                config.endpoint.clone(),
                config.grid,
                config.background,
            ),
            artifact_mode: config.artifact_mode,
            prometheus,
        }
    }
}

//! Scripted tile fetcher shared by the director integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use director::config::{DirectorConfig, WorkerEndpoint};
use director::{Orchestrator, TileFetcher, TileRequest, TransportError};
use futures::FutureExt;
use render_common::{GridShape, Rgb};

/// What the fake worker does for one tile.
#[derive(Debug, Clone)]
pub enum Script {
    /// Respond immediately with this body
    Body(Vec<u8>),
    /// Respond with this body after a delay
    Delayed(Duration, Vec<u8>),
    /// Respond with a non-success status
    Status(u16),
    /// Fail after a delay, like a timeout
    FailAfter(Duration),
    /// Refuse to issue the request at all
    Refuse,
}

/// Answers tile requests from a per-index script, in dispatch order.
pub struct ScriptedFetcher {
    scripts: Vec<Script>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts,
            urls: Mutex::new(Vec::new()),
        })
    }

    /// Every URL dispatched so far.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl TileFetcher for ScriptedFetcher {
    fn dispatch(&self, url: &str) -> Result<TileRequest, TransportError> {
        let mut urls = self.urls.lock().unwrap();
        let index = urls.len();
        urls.push(url.to_string());

        let script = self
            .scripts
            .get(index)
            .cloned()
            .unwrap_or(Script::Status(404));
        match script {
            Script::Body(body) => Ok(async move { Ok(Bytes::from(body)) }.boxed()),
            Script::Delayed(delay, body) => Ok(async move {
                tokio::time::sleep(delay).await;
                Ok(Bytes::from(body))
            }
            .boxed()),
            Script::Status(code) => Ok(async move { Err(TransportError::Status(code)) }.boxed()),
            Script::FailAfter(delay) => Ok(async move {
                tokio::time::sleep(delay).await;
                Err(TransportError::Request("operation timed out".to_string()))
            }
            .boxed()),
            Script::Refuse => Err(TransportError::Dispatch {
                url: url.to_string(),
                reason: "refused by script".to_string(),
            }),
        }
    }
}

pub fn named_endpoint() -> WorkerEndpoint {
    WorkerEndpoint::Named {
        base_name: "worker".to_string(),
        port: 8000,
    }
}

pub fn orchestrator(fetcher: Arc<dyn TileFetcher>, rows: u32, cols: u32, background: Rgb) -> Orchestrator {
    Orchestrator::new(
        fetcher,
        named_endpoint(),
        GridShape::new(rows, cols).unwrap(),
        background,
    )
}

pub fn config(rows: u32, cols: u32) -> DirectorConfig {
    DirectorConfig {
        port: 0,
        endpoint: named_endpoint(),
        grid: GridShape::new(rows, cols).unwrap(),
        background: Rgb::WHITE,
        request_timeout: Duration::from_secs(5),
        artifact_mode: Default::default(),
    }
}

//! Error types for render requests.

use thiserror::Error;

use crate::RegionParseError;

/// Result type alias using RenderError.
pub type RenderResult<T> = Result<T, RenderError>;

/// Body sent for malformed render paths.
pub const NOT_FOUND_BODY: &str = "not found";
/// Body sent when the canvas cannot be allocated.
pub const OUT_OF_MEMORY_BODY: &str = "out of memory";
/// Body sent for every other server-side failure.
pub const INTERNAL_ERROR_BODY: &str = "internal error";

/// Request-level failures of a render.
///
/// Per-tile transport and decode failures never appear here: they are
/// absorbed by the orchestrator and leave the tile at the background color.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid render target: {0}")]
    InvalidTarget(#[from] RegionParseError),

    #[error("Cannot allocate a {width}x{height} canvas")]
    OutOfMemory { width: u32, height: u32 },

    #[error("Failed to produce image artifact: {0}")]
    Artifact(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RenderError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            RenderError::InvalidTarget(_) => 404,
            _ => 500,
        }
    }

    /// Plain-text body returned to the client.
    ///
    /// The detailed message is only logged.
    pub fn public_message(&self) -> &'static str {
        match self {
            RenderError::InvalidTarget(_) => NOT_FOUND_BODY,
            RenderError::OutOfMemory { .. } => OUT_OF_MEMORY_BODY,
            RenderError::Artifact(_) | RenderError::Internal(_) => INTERNAL_ERROR_BODY,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Artifact(err.to_string())
    }
}

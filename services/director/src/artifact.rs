//! Turning the assembled canvas into response bytes.

use std::io::{Read, Seek, SeekFrom, Write};

use render_common::{RenderError, RenderResult};
use renderer::{png, Canvas};
use tracing::debug;

/// How the final image is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactMode {
    /// Encode straight into memory
    #[default]
    InMemory,
    /// Write to an anonymous temporary file and read it back
    Spool,
}

/// Encode `canvas` as PNG according to `mode`.
///
/// Any failure, including temp-file I/O, is an artifact error.
pub fn produce(canvas: &Canvas, mode: ArtifactMode) -> RenderResult<Vec<u8>> {
    let encoded = png::encode_canvas(canvas).map_err(|e| RenderError::Artifact(e.to_string()))?;

    match mode {
        ArtifactMode::InMemory => Ok(encoded),
        ArtifactMode::Spool => spool(&encoded),
    }
}

fn spool(encoded: &[u8]) -> RenderResult<Vec<u8>> {
    let mut file = tempfile::Builder::new()
        .prefix("mandel")
        .suffix(".png")
        .tempfile()?;
    debug!(path = %file.path().display(), bytes = encoded.len(), "Spooling image");

    file.write_all(encoded)?;
    file.flush()?;
    file.seek(SeekFrom::Start(0))?;

    let mut bytes = Vec::with_capacity(encoded.len());
    file.read_to_end(&mut bytes)?;
    // The file is removed when `file` drops
    Ok(bytes)
}

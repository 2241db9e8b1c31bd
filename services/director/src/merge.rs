//! Compositing of finished tiles into the output canvas.

use render_common::TileCell;
use renderer::png::{self, PngError};
use renderer::Canvas;
use thiserror::Error;

/// Why a tile body could not be composited. Never escalated to the client.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Undecodable tile: {0}")]
    Decode(#[from] PngError),

    #[error("Tile is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    SizeMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: usize,
        actual_height: usize,
    },
}

/// Decode a worker response and blit it over the cell's footprint.
///
/// On error the canvas is left untouched, so the cell keeps whatever
/// background it was filled with.
pub fn merge_tile(canvas: &mut Canvas, cell: &TileCell, body: &[u8]) -> Result<(), MergeError> {
    let tile = png::decode_rgb(body)?;

    if tile.width() != cell.width as usize || tile.height() != cell.height as usize {
        return Err(MergeError::SizeMismatch {
            expected_width: cell.width,
            expected_height: cell.height,
            actual_width: tile.width(),
            actual_height: tile.height(),
        });
    }

    canvas.blit(
        &tile,
        cell.pixel_x as i64,
        cell.pixel_y as i64,
        cell.width as i64,
        cell.height as i64,
        0,
        0,
    );
    Ok(())
}

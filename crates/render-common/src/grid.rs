//! Partitioning of a render region into a fixed grid of tiles.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::{Region, RegionParseError};

/// Shape of the worker grid: `rows` horizontal bands by `cols` vertical bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    rows: NonZeroU32,
    cols: NonZeroU32,
}

impl GridShape {
    /// Returns `None` if either dimension is zero.
    pub fn new(rows: u32, cols: u32) -> Option<Self> {
        Some(Self {
            rows: NonZeroU32::new(rows)?,
            cols: NonZeroU32::new(cols)?,
        })
    }

    /// A single tile covering the whole region.
    pub fn single() -> Self {
        Self {
            rows: NonZeroU32::MIN,
            cols: NonZeroU32::MIN,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows.get()
    }

    pub fn cols(&self) -> u32 {
        self.cols.get()
    }

    /// Total number of tiles in the grid.
    pub fn len(&self) -> usize {
        self.rows() as usize * self.cols() as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Display for GridShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows(), self.cols())
    }
}

/// One cell of a partitioned region.
///
/// Pixel fields locate the cell on the destination canvas; coordinate fields
/// give the slice of the complex plane it covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileCell {
    /// Row-major position in the grid (`row * cols + col`)
    pub index: usize,
    pub row: u32,
    pub col: u32,
    /// Left edge on the canvas, in pixels
    pub pixel_x: u32,
    /// Top edge on the canvas, in pixels
    pub pixel_y: u32,
    pub width: u32,
    pub height: u32,
    pub start_re: f64,
    pub start_im: f64,
    pub end_re: f64,
    pub end_im: f64,
}

impl TileCell {
    /// The region a worker must render for this cell.
    ///
    /// Fails when the grid is finer than the image and the cell has no pixels.
    pub fn region(&self) -> Result<Region, RegionParseError> {
        Region::new(
            self.width,
            self.height,
            self.start_re,
            self.start_im,
            self.end_re,
            self.end_im,
        )
    }
}

/// Pixel size shared by every tile of `outer` split into `shape`.
///
/// Remainder columns and rows are dropped, never redistributed.
pub fn tile_size(outer: &Region, shape: GridShape) -> (u32, u32) {
    (outer.width / shape.cols(), outer.height / shape.rows())
}

/// Split `outer` into `shape.len()` cells in row-major order.
pub fn partition(outer: &Region, shape: GridShape) -> Vec<TileCell> {
    let (tile_width, tile_height) = tile_size(outer, shape);
    let step_re = outer.span_re() / shape.cols() as f64;
    let step_im = outer.span_im() / shape.rows() as f64;

    let mut cells = Vec::with_capacity(shape.len());
    for row in 0..shape.rows() {
        for col in 0..shape.cols() {
            let start_re = outer.start_re + step_re * col as f64;
            let start_im = outer.start_im + step_im * row as f64;
            cells.push(TileCell {
                index: cells.len(),
                row,
                col,
                pixel_x: col * tile_width,
                pixel_y: row * tile_height,
                width: tile_width,
                height: tile_height,
                start_re,
                start_im,
                end_re: start_re + step_re,
                end_im: start_im + step_im,
            });
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shape_rejected() {
        assert!(GridShape::new(0, 3).is_none());
        assert!(GridShape::new(3, 0).is_none());
        assert_eq!(GridShape::new(2, 3).unwrap().len(), 6);
    }

    #[test]
    fn test_partition_is_row_major() {
        let outer = Region::new(90, 60, -2.0, -1.0, 1.0, 1.0).unwrap();
        let cells = partition(&outer, GridShape::new(2, 3).unwrap());

        assert_eq!(cells.len(), 6);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.index, i);
            assert_eq!(cell.index, (cell.row * 3 + cell.col) as usize);
        }
        assert_eq!((cells[4].row, cells[4].col), (1, 1));
        assert_eq!((cells[4].pixel_x, cells[4].pixel_y), (30, 30));
    }
}

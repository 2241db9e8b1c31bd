//! Packed RGB pixel buffers and rectangular blits.
//!
//! A [`Canvas`] stores pixels row-major, three bytes per pixel, with no
//! padding between rows (`stride == 3 * width`). It is used both for the
//! full-resolution image a director assembles and for the individual tiles
//! a worker renders.

use render_common::{RenderError, Rgb};

/// Bytes per pixel (R, G, B).
pub const CHANNELS: usize = 3;

/// An owned, packed RGB image.
#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Canvas {
    /// Allocate a zeroed canvas.
    ///
    /// The buffer is reserved fallibly so that an oversized request surfaces
    /// as [`CanvasError::OutOfMemory`] instead of aborting the process.
    pub fn allocate(width: usize, height: usize) -> Result<Self, CanvasError> {
        let size = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(CHANNELS))
            .ok_or(CanvasError::OutOfMemory { width, height })?;

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| CanvasError::OutOfMemory { width, height })?;
        data.resize(size, 0);

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap an existing packed RGB buffer.
    pub fn from_rgb(width: usize, height: usize, data: Vec<u8>) -> Result<Self, CanvasError> {
        let expected = width * height * CHANNELS;
        if data.len() != expected {
            return Err(CanvasError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width * CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The packed pixel buffer, `stride() * height()` bytes long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline(always)]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * CHANNELS
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Rgb) {
        let rgb = color.to_array();
        for pixel in self.data.chunks_exact_mut(CHANNELS) {
            pixel.copy_from_slice(&rgb);
        }
    }

    /// Write one pixel. Panics if `(x, y)` is outside the canvas.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        debug_assert!(x < self.width && y < self.height);
        let offset = self.offset(x, y);
        self.data[offset..offset + CHANNELS].copy_from_slice(&color.to_array());
    }

    /// Read one pixel. Panics if `(x, y)` is outside the canvas.
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> Rgb {
        debug_assert!(x < self.width && y < self.height);
        let offset = self.offset(x, y);
        Rgb::new(
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        )
    }

    /// Copy a `w` x `h` rectangle of `src` starting at `(src_x0, src_y0)` onto
    /// this canvas at `(dst_x0, dst_y0)`.
    ///
    /// Both corners of the destination rectangle and the source origin are
    /// clamped into `[0, dimension - 1]`. Every source sample is clamped into
    /// the source bounds as well, so a source smaller than the rectangle
    /// repeats its last row/column. Nothing outside either buffer is touched.
    #[allow(clippy::too_many_arguments)]
    pub fn blit(
        &mut self,
        src: &Canvas,
        dst_x0: i64,
        dst_y0: i64,
        w: i64,
        h: i64,
        src_x0: i64,
        src_y0: i64,
    ) {
        if self.is_empty() || src.is_empty() || w <= 0 || h <= 0 {
            return;
        }

        let dst_max_x = self.width as i64 - 1;
        let dst_max_y = self.height as i64 - 1;
        let src_max_x = src.width as i64 - 1;
        let src_max_y = src.height as i64 - 1;

        let dst_x0 = dst_x0.clamp(0, dst_max_x);
        let dst_y0 = dst_y0.clamp(0, dst_max_y);
        let dst_x1 = (dst_x0 + w - 1).clamp(0, dst_max_x);
        let dst_y1 = (dst_y0 + h - 1).clamp(0, dst_max_y);
        let src_x0 = src_x0.clamp(0, src_max_x);
        let src_y0 = src_y0.clamp(0, src_max_y);

        for dst_y in dst_y0..=dst_y1 {
            let src_y = (dst_y + src_y0 - dst_y0).clamp(0, src_max_y) as usize;

            // Fast path: the whole row span lies inside the source.
            if src_x0 + (dst_x1 - dst_x0) <= src_max_x {
                let len = (dst_x1 - dst_x0 + 1) as usize * CHANNELS;
                let s = src.offset(src_x0 as usize, src_y);
                let d = self.offset(dst_x0 as usize, dst_y as usize);
                self.data[d..d + len].copy_from_slice(&src.data[s..s + len]);
                continue;
            }

            for dst_x in dst_x0..=dst_x1 {
                let src_x = (dst_x + src_x0 - dst_x0).clamp(0, src_max_x) as usize;
                let s = src.offset(src_x, src_y);
                let d = self.offset(dst_x as usize, dst_y as usize);
                self.data[d..d + CHANNELS].copy_from_slice(&src.data[s..s + CHANNELS]);
            }
        }
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CanvasError {
    #[error("Out of memory allocating a {width}x{height} canvas")]
    OutOfMemory { width: usize, height: usize },

    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

impl From<CanvasError> for RenderError {
    fn from(err: CanvasError) -> Self {
        match err {
            CanvasError::OutOfMemory { width, height } => RenderError::OutOfMemory {
                width: width.min(u32::MAX as usize) as u32,
                height: height.min(u32::MAX as usize) as u32,
            },
            other => RenderError::Internal(other.to_string()),
        }
    }
}

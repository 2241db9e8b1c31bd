//! Escape-time Mandelbrot kernel.
//!
//! Iterates `z(n+1) = z(n)^2 + c` from `z(0) = 0` and counts the steps
//! until `|z|^2 > 4` or the iteration budget runs out. The count is mapped
//! to a gray level: points that escape immediately are white, points that
//! never escape are black.

use rayon::prelude::*;
use render_common::{Region, Rgb};

use crate::canvas::{Canvas, CanvasError, CHANNELS};

/// Iteration budget used when none is configured.
pub const DEFAULT_MAX_ITER: u32 = 100;

/// Number of iterations before `c` escapes, capped at `max_iter`.
#[inline]
pub fn escape_iterations(c_re: f64, c_im: f64, max_iter: u32) -> u32 {
    let (mut z_re, mut z_im) = (0.0f64, 0.0f64);
    let mut n = 0;
    while n < max_iter {
        if z_re * z_re + z_im * z_im > 4.0 {
            break;
        }
        let next_re = z_re * z_re - z_im * z_im + c_re;
        z_im = 2.0 * z_re * z_im + c_im;
        z_re = next_re;
        n += 1;
    }
    n
}

/// Map an iteration count onto `255..=0`.
#[inline]
pub fn gray_level(iterations: u32, max_iter: u32) -> u8 {
    if max_iter == 0 {
        return 255;
    }
    255 - (iterations as f64 * 255.0 / max_iter as f64) as u8
}

/// Render `region` into a new canvas of its pixel size.
///
/// Pixel `(x, y)` samples `c = start + (x / width, y / height) * span`, so
/// the end corner itself is never sampled. Rows are rendered in parallel.
pub fn render_region(region: &Region, max_iter: u32) -> Result<Canvas, CanvasError> {
    let width = region.width as usize;
    let height = region.height as usize;
    let span_re = region.span_re();
    let span_im = region.span_im();
    let stride = width * CHANNELS;

    let mut pixels = Canvas::allocate(width, height)?.into_raw();
    pixels
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let c_im = region.start_im + (y as f64 / height as f64) * span_im;
            for (x, pixel) in row.chunks_exact_mut(CHANNELS).enumerate() {
                let c_re = region.start_re + (x as f64 / width as f64) * span_re;
                let level = gray_level(escape_iterations(c_re, c_im, max_iter), max_iter);
                pixel.copy_from_slice(&Rgb::gray(level).to_array());
            }
        });

    Canvas::from_rgb(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_never_escapes() {
        assert_eq!(escape_iterations(0.0, 0.0, 100), 100);
        assert_eq!(escape_iterations(-1.0, 0.0, 50), 50);
    }

    #[test]
    fn test_far_point_escapes_quickly() {
        // z1 = c = 2+2i already has |z|^2 = 8
        assert_eq!(escape_iterations(2.0, 2.0, 100), 1);
    }

    #[test]
    fn test_gray_level_range() {
        assert_eq!(gray_level(0, 100), 255);
        assert_eq!(gray_level(100, 100), 0);
        assert_eq!(gray_level(50, 100), 128);
    }
}

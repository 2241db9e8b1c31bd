//! Generators for synthetic tiles.
//!
//! Worker responses are PNG files; these helpers build valid and invalid
//! ones without going through the crate under test.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use render_common::Rgb;

/// Packed RGB buffer where every pixel is `color`.
pub fn solid_pixels(width: u32, height: u32, color: Rgb) -> Vec<u8> {
    color
        .to_array()
        .iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * 3)
        .collect()
}

/// Packed RGB buffer with a distinct, predictable value per pixel.
///
/// Pixel `(x, y)` is `(x + seed, y + seed, seed)` (wrapping), which makes
/// misplaced or transposed tiles easy to spot.
pub fn pattern_pixels(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            data.push((x as u8).wrapping_add(seed));
            data.push((y as u8).wrapping_add(seed));
            data.push(seed);
        }
    }
    data
}

/// Encode raw pixels of the given color type as PNG.
pub fn encode_png(width: u32, height: u32, pixels: &[u8], color: ColorType) -> Vec<u8> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(pixels, width, height, color)
        .expect("PNG encoding of test tile failed");
    buf
}

/// A valid 3-channel PNG filled with `color`.
pub fn solid_tile_png(width: u32, height: u32, color: Rgb) -> Vec<u8> {
    encode_png(width, height, &solid_pixels(width, height, color), ColorType::Rgb8)
}

/// A valid 3-channel PNG with [`pattern_pixels`] content.
pub fn pattern_tile_png(width: u32, height: u32, seed: u8) -> Vec<u8> {
    encode_png(width, height, &pattern_pixels(width, height, seed), ColorType::Rgb8)
}

/// A well-formed PNG with four channels, which tile decoding must reject.
pub fn rgba_tile_png(width: u32, height: u32) -> Vec<u8> {
    let pixels = vec![200u8; width as usize * height as usize * 4];
    encode_png(width, height, &pixels, ColorType::Rgba8)
}

/// A well-formed single-channel PNG, which tile decoding must reject.
pub fn gray_tile_png(width: u32, height: u32) -> Vec<u8> {
    let pixels = vec![90u8; width as usize * height as usize];
    encode_png(width, height, &pixels, ColorType::L8)
}

/// Bytes that look like a PNG header but do not decode.
pub fn corrupt_png() -> Vec<u8> {
    let mut bytes = vec![137, 80, 78, 71, 13, 10, 26, 10];
    bytes.extend_from_slice(b"definitely not a chunk stream");
    bytes
}

/// Locate the first pixel of a rectangle that differs from `color`.
///
/// Returns `(x, y, found)` or `None` if the whole rectangle matches.
pub fn first_mismatch(
    pixels: &[u8],
    width: u32,
    (x0, y0, w, h): (u32, u32, u32, u32),
    color: Rgb,
) -> Option<(u32, u32, Rgb)> {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let i = ((y * width + x) * 3) as usize;
            let found = Rgb::new(pixels[i], pixels[i + 1], pixels[i + 2]);
            if found != color {
                return Some((x, y, found));
            }
        }
    }
    None
}

//! PNG encoding and decoding for RGB canvases.
//!
//! Encoding supports two modes:
//! - **Indexed PNG (color type 3)**: Used when the image has ≤256 unique
//!   colors. Escape-time renders are grayscale with at most `max_iter + 1`
//!   levels, so this is the common case.
//! - **RGB PNG (color type 2)**: Fallback for images with >256 colors.
//!
//! Decoding goes through the `image` crate and only accepts images that are
//! stored with exactly three channels.

use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;

use crate::canvas::{Canvas, CHANNELS};

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

/// Encode a canvas, choosing indexed or RGB mode automatically.
pub fn encode_canvas(canvas: &Canvas) -> Result<Vec<u8>, PngError> {
    create_png_auto(canvas.as_bytes(), canvas.width(), canvas.height())
}

/// Create a PNG image with automatic format selection.
///
/// - If ≤256 unique colors: uses indexed PNG (smaller, faster)
/// - Otherwise: uses RGB PNG (full color)
///
/// # Arguments
/// - `pixels`: RGB pixel data (3 bytes per pixel)
/// - `width`: Image width in pixels
/// - `height`: Image height in pixels
pub fn create_png_auto(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, PngError> {
    check_dimensions(pixels, width, height)?;
    let num_pixels = pixels.len() / CHANNELS;

    let palette_result = if num_pixels >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match palette_result {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices),
        None => create_png(pixels, width, height),
    }
}

fn check_dimensions(pixels: &[u8], width: usize, height: usize) -> Result<(), PngError> {
    if width == 0 || height == 0 || width > u32::MAX as usize || height > u32::MAX as usize {
        return Err(PngError::InvalidDimensions { width, height });
    }
    let expected = width * height * CHANNELS;
    if pixels.len() != expected {
        return Err(PngError::BufferSize {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Pack RGB bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16)
}

/// Unpack u32 back to an RGB tuple
#[inline(always)]
fn unpack_color(packed: u32) -> (u8, u8, u8) {
    (packed as u8, (packed >> 8) as u8, (packed >> 16) as u8)
}

/// Sequential palette extraction for small images.
fn extract_palette_sequential(pixels: &[u8]) -> Option<(Vec<(u8, u8, u8)>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<(u8, u8, u8)> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / CHANNELS);

    for chunk in pixels.chunks_exact(CHANNELS) {
        let packed = pack_color(chunk[0], chunk[1], chunk[2]);

        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push((chunk[0], chunk[1], chunk[2]));
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Parallel palette extraction for larger images.
///
/// 1. Collect unique colors per chunk in parallel
/// 2. Merge them and bail out if there are more than 256
/// 3. Map every pixel to its palette index in parallel
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Vec<(u8, u8, u8)>, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / CHANNELS / rayon::current_num_threads()).max(256);
    let chunk_size = chunk_pixels * CHANNELS;

    let unique_colors: Vec<u32> = pixels
        .par_chunks(chunk_size)
        .flat_map(|chunk| {
            let mut local_colors: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for pixel in chunk.chunks_exact(CHANNELS) {
                local_colors.insert(pack_color(pixel[0], pixel[1], pixel[2]), ());
                if local_colors.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local_colors.into_keys().collect::<Vec<_>>()
        })
        .collect();

    let mut global_colors: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<(u8, u8, u8)> = Vec::with_capacity(MAX_PALETTE_SIZE);

    for packed in unique_colors {
        if !global_colors.contains_key(&packed) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            global_colors.insert(packed, palette.len() as u8);
            palette.push(unpack_color(packed));
        }
    }

    let mut indices = vec![0u8; pixels.len() / CHANNELS];
    indices
        .par_chunks_mut(chunk_pixels)
        .zip(pixels.par_chunks(chunk_size))
        .for_each(|(idx_chunk, pixel_chunk)| {
            for (idx, pixel) in idx_chunk.iter_mut().zip(pixel_chunk.chunks_exact(CHANNELS)) {
                let packed = pack_color(pixel[0], pixel[1], pixel[2]);
                *idx = *global_colors.get(&packed).unwrap_or(&0);
            }
        });

    Some((palette, indices))
}

/// Create an indexed PNG (color type 3) from palette and indices.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8)],
    indices: &[u8],
) -> Result<Vec<u8>, PngError> {
    if indices.len() != width * height {
        return Err(PngError::BufferSize {
            expected: width * height,
            actual: indices.len(),
        });
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let mut plte_data = Vec::with_capacity(palette.len() * 3);
    for (r, g, b) in palette {
        plte_data.extend_from_slice(&[*r, *g, *b]);
    }
    write_chunk(&mut png, b"PLTE", &plte_data);

    let idat_data = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Create a truecolor PNG (color type 2) from packed RGB data.
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, PngError> {
    check_dimensions(pixels, width, height)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 2));

    let idat_data = deflate_scanlines(pixels, width * CHANNELS, height)?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression method
    data.push(0); // filter method
    data.push(0); // interlace method
    data
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix every `row_bytes`-long scanline with filter type 0 and deflate.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> Result<Vec<u8>, PngError> {
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    Ok(encoder.finish()?)
}

/// Decode a PNG (or any format `image` recognises) into a canvas.
///
/// The source must be stored with exactly three channels; grayscale and
/// alpha images are rejected rather than converted.
pub fn decode_rgb(bytes: &[u8]) -> Result<Canvas, PngError> {
    let image = image::load_from_memory(bytes).map_err(|e| PngError::Decode(e.to_string()))?;

    let channels = image.color().channel_count();
    if channels as usize != CHANNELS {
        return Err(PngError::ChannelCount(channels));
    }

    let rgb = image.into_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    Canvas::from_rgb(width, height, rgb.into_raw()).map_err(|e| PngError::Decode(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum PngError {
    #[error("Cannot encode a {width}x{height} image")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("IDAT compression failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Expected 3 channels, got {0}")]
    ChannelCount(u8),
}

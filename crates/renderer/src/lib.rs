//! Pixel buffers, PNG codec and the escape-time kernel.
//!
//! - [`canvas`]: packed RGB images with fill, pixel access and clamped blits
//! - [`png`]: indexed/truecolor PNG encoding and 3-channel decoding
//! - [`escape_time`]: the Mandelbrot kernel workers run per tile

pub mod canvas;
pub mod escape_time;
pub mod png;

pub use canvas::{Canvas, CanvasError, CHANNELS};
pub use png::PngError;

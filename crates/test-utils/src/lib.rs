//! Shared test utilities for the mandelbrot-farm workspace.
//!
//! This crate provides common testing infrastructure including:
//! - PNG tile generators (valid, wrong channel count, corrupt)
//! - Deterministic pixel patterns
//! - Common render regions
//! - Pixel-rectangle assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that every pixel of a rectangle in a packed RGB buffer has one color.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_rect_color;
///
/// // 2x2 rectangle at (0, 0) of a 4-pixel-wide buffer must be white
/// assert_rect_color!(pixels, 4, (0, 0, 2, 2), Rgb::WHITE);
/// ```
#[macro_export]
macro_rules! assert_rect_color {
    ($pixels:expr, $width:expr, ($x0:expr, $y0:expr, $w:expr, $h:expr), $color:expr) => {{
        if let Some((x, y, found)) =
            $crate::first_mismatch($pixels, $width, ($x0, $y0, $w, $h), $color)
        {
            panic!(
                "pixel ({}, {}) is {:?}, expected {:?} for rect {:?}",
                x,
                y,
                found,
                $color,
                ($x0, $y0, $w, $h)
            );
        }
    }};
}

//! Render regions: a pixel grid mapped onto a span of the complex plane.

use serde::{Deserialize, Serialize};

/// A rectangular pixel area mapped onto a rectangular coordinate span.
///
/// `start_*` is the corner sampled by pixel (0, 0); `end_*` is the opposite
/// corner. The span may be inverted (end < start) to flip an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub start_re: f64,
    pub start_im: f64,
    pub end_re: f64,
    pub end_im: f64,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Create a region, rejecting empty pixel dimensions and non-finite bounds.
    pub fn new(
        width: u32,
        height: u32,
        start_re: f64,
        start_im: f64,
        end_re: f64,
        end_im: f64,
    ) -> Result<Self, RegionParseError> {
        if width == 0 {
            return Err(RegionParseError::EmptyDimension("width"));
        }
        if height == 0 {
            return Err(RegionParseError::EmptyDimension("height"));
        }
        for (field, value) in [
            ("re0", start_re),
            ("im0", start_im),
            ("re1", end_re),
            ("im1", end_im),
        ] {
            if !value.is_finite() {
                return Err(RegionParseError::InvalidCoordinate {
                    field,
                    value: value.to_string(),
                });
            }
        }

        Ok(Self {
            start_re,
            start_im,
            end_re,
            end_im,
            width,
            height,
        })
    }

    /// Parse a request target of the form `/{width}/{height}/{re0}/{im0}/{re1}/{im1}`.
    ///
    /// A single trailing slash is tolerated. Anything else (missing or extra
    /// segments, non-numeric fields, zero sizes) is rejected.
    pub fn from_path(path: &str) -> Result<Self, RegionParseError> {
        let trimmed = path
            .strip_prefix('/')
            .ok_or_else(|| RegionParseError::InvalidFormat(path.to_string()))?;
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.len() != 6 {
            return Err(RegionParseError::InvalidFormat(path.to_string()));
        }

        let width = parse_dimension("width", parts[0])?;
        let height = parse_dimension("height", parts[1])?;
        let start_re = parse_coordinate("re0", parts[2])?;
        let start_im = parse_coordinate("im0", parts[3])?;
        let end_re = parse_coordinate("re1", parts[4])?;
        let end_im = parse_coordinate("im1", parts[5])?;

        Self::new(width, height, start_re, start_im, end_re, end_im)
    }

    /// Format this region as a request path, the inverse of [`Region::from_path`].
    ///
    /// Coordinates use the shortest representation that parses back to the
    /// same `f64`, so deep zooms survive the round trip to a worker.
    pub fn to_path(&self) -> String {
        format!(
            "/{}/{}/{:?}/{:?}/{:?}/{:?}",
            self.width, self.height, self.start_re, self.start_im, self.end_re, self.end_im
        )
    }

    /// Extent of the real axis.
    pub fn span_re(&self) -> f64 {
        self.end_re - self.start_re
    }

    /// Extent of the imaginary axis.
    pub fn span_im(&self) -> f64 {
        self.end_im - self.start_im
    }

    /// Number of pixels covered by the region.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn parse_dimension(field: &'static str, raw: &str) -> Result<u32, RegionParseError> {
    raw.parse().map_err(|_| RegionParseError::InvalidDimension {
        field,
        value: raw.to_string(),
    })
}

fn parse_coordinate(field: &'static str, raw: &str) -> Result<f64, RegionParseError> {
    raw.parse().map_err(|_| RegionParseError::InvalidCoordinate {
        field,
        value: raw.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionParseError {
    #[error("Invalid render path: {0}. Expected '/width/height/re0/im0/re1/im1'")]
    InvalidFormat(String),

    #[error("Invalid {field}: {value}")]
    InvalidDimension { field: &'static str, value: String },

    #[error("Invalid coordinate {field}: {value}")]
    InvalidCoordinate { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    EmptyDimension(&'static str),
}

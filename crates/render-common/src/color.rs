//! RGB color values used for canvas fills.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Same value on all three channels.
    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Accepts `"r,g,b"` (decimal channels) or `"#RRGGBB"`.
impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(ColorParseError::InvalidFormat(s.to_string()));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| ColorParseError::InvalidChannel(hex[i..i + 2].to_string()))
            };
            return Ok(Self::new(channel(0)?, channel(2)?, channel(4)?));
        }

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ColorParseError::InvalidFormat(s.to_string()));
        }
        let channel = |raw: &str| {
            raw.parse::<u8>()
                .map_err(|_| ColorParseError::InvalidChannel(raw.to_string()))
        };
        Ok(Self::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorParseError {
    #[error("Invalid color: {0}. Expected 'r,g,b' or '#RRGGBB'")]
    InvalidFormat(String),

    #[error("Invalid color channel: {0}")]
    InvalidChannel(String),
}

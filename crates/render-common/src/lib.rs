//! Common types shared by the director and worker services.

pub mod color;
pub mod error;
pub mod grid;
pub mod region;

pub use color::{ColorParseError, Rgb};
pub use error::{RenderError, RenderResult};
pub use grid::{partition, tile_size, GridShape, TileCell};
pub use region::{Region, RegionParseError};

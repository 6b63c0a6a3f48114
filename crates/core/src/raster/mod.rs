//! Raster data structures
//!
//! Used for elevation grids and for label grids produced by rasterizing
//! basin polygons.

mod element;
mod geotransform;
mod grid;

pub use element::RasterElement;
pub use geotransform::{Bounds, GeoTransform};
pub use grid::{Raster, RasterStatistics};

//! Vector to raster operations
//!
//! - Rasterize: burn polygons into an integer label grid
//! - Basin masks: restrict a DEM to one labelled basin

mod rasterize;

pub use rasterize::{mask_to_basin, rasterize, rasterize_basins};

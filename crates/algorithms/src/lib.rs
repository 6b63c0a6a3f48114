//! # Basmati Algorithms
//!
//! Basin hierarchy queries and the raster helpers built on them.
//!
//! ## Available Algorithm Categories
//!
//! - **hierarchy**: Downstream, upstream, level up/down and area selection
//!   over a basin table
//! - **vector**: Rasterization of basin polygons, DEM masking by basin
//! - **statistics**: Coarse graining, zonal statistics

pub mod hierarchy;
pub mod statistics;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hierarchy::{
        ancestors, area_select, find_downstream, find_next_level_larger,
        find_next_level_smaller, find_terminus, find_upstream, AreaSelect, AreaSelectParams,
        BasinView,
    };
    pub use crate::statistics::{coarse_grain, zonal_statistics, ZonalResult};
    pub use crate::vector::{mask_to_basin, rasterize, rasterize_basins};
    pub use basmati_core::prelude::*;
}

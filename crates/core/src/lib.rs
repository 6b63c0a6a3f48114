//! # Basmati Core
//!
//! Core types, traits and I/O for the basmati basin hierarchy engine.
//!
//! This crate provides:
//! - `PfafCode` and `is_downstream`: Pfafstetter codes and the code comparator
//! - `BasinTable`: basins of one region across levels, with adjacency indices
//! - `Raster<T>` and `GeoTransform`: georeferenced grids for elevation data
//! - `CRS`: Coordinate Reference System handling
//! - Algorithm traits for consistent API
//! - I/O for HydroBASINS shapefiles, HydroSHEDS BIL grids and GeoTIFF

pub mod basin;
pub mod crs;
pub mod error;
pub mod io;
pub mod pfaf;
pub mod raster;

pub use basin::{BasinRecord, BasinTable, LevelBatch};
pub use crs::CRS;
pub use error::{Error, Result};
pub use pfaf::{is_downstream, try_is_downstream, PfafCode, ToPfafCode};
pub use raster::{Bounds, GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::basin::{BasinRecord, BasinTable};
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::pfaf::{is_downstream, PfafCode, ToPfafCode};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Core trait for algorithms over basin tables and rasters.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

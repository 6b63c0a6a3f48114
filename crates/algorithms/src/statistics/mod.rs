//! Statistical summaries of raster data
//!
//! - **coarse_grain**: block means over non-overlapping windows
//! - **zonal**: statistics per labelled zone

pub mod coarse_grain;
pub mod zonal;

pub use coarse_grain::coarse_grain;
pub use zonal::{zonal_statistics, ZonalResult};

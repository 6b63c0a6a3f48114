//! File collaborators: HydroBASINS polygons, HydroSHEDS elevation grids and
//! GeoTIFF exchange

mod bil;
mod geotiff;
mod hydrobasins;

pub use bil::{load_hydrosheds_dem, read_bil, BilHeader, PixelType, DEFAULT_DEM_RESOLUTION};
pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
pub use hydrobasins::{hydrobasins_path, load_hydrobasins, read_level, ALL_LEVELS};

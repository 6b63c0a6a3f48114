//! Error types for basmati

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for basmati operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("no data for region '{region}' at level {level}: {} does not exist", .path.display())]
    RegionNotFound {
        region: String,
        level: u8,
        path: PathBuf,
    },

    #[error("no {resolution} DEM for region '{region}': {} does not exist", .path.display())]
    DemNotFound {
        region: String,
        resolution: String,
        path: PathBuf,
    },

    #[error("inconsistent reference system: level {level} uses {found}, expected {expected}")]
    InconsistentReferenceSystem {
        level: u8,
        expected: String,
        found: String,
    },

    #[error("data inconsistency: {0}")]
    DataInconsistency(String),

    #[error("no basin matching {0}")]
    BasinNotFound(String),

    #[error("invalid Pfafstetter code '{0}': expected a non-empty string of decimal digits")]
    InvalidPfafCode(String),

    #[error("geometries {first} and {second} overlap at cell ({row}, {col})")]
    OverlappingGeometries {
        row: usize,
        col: usize,
        first: usize,
        second: usize,
    },

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("shapefile error: {0}")]
    Shapefile(String),

    #[error("{0}")]
    Other(String),
}

impl From<shapefile::Error> for Error {
    fn from(e: shapefile::Error) -> Self {
        Error::Shapefile(e.to_string())
    }
}

/// Result type alias for basmati operations
pub type Result<T> = std::result::Result<T, Error>;

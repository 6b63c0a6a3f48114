//! HydroSHEDS elevation grids in ESRI BIL format
//!
//! A `.bil` file holds raw cell values row by row; the `.hdr` file beside it
//! describes the layout with `KEY value` lines:
//!
//! ```text
//! BYTEORDER      I
//! LAYOUT         BIL
//! NROWS          6000
//! NCOLS          9600
//! NBANDS         1
//! NBITS          16
//! PIXELTYPE      SIGNEDINT
//! NODATA         32767
//! ULXMAP         57.00416666666667
//! ULYMAP         59.99583333333333
//! XDIM           0.00833333333333
//! YDIM           0.00833333333333
//! ```
//!
//! `ULXMAP`/`ULYMAP` locate the centre of the top-left cell.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolution suffix of the HydroSHEDS DEM files used by default (30 arc-seconds)
pub const DEFAULT_DEM_RESOLUTION: &str = "30s";

/// Interpretation of the stored bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    Signed,
    Unsigned,
    Float,
}

/// Parsed `.hdr` sidecar
#[derive(Debug, Clone, PartialEq)]
pub struct BilHeader {
    pub nrows: usize,
    pub ncols: usize,
    pub nbands: usize,
    pub nbits: usize,
    pub big_endian: bool,
    pub pixel_type: PixelType,
    pub skip_bytes: usize,
    pub band_row_bytes: usize,
    pub total_row_bytes: usize,
    pub ulxmap: f64,
    pub ulymap: f64,
    pub xdim: f64,
    pub ydim: f64,
    pub nodata: Option<f64>,
}

impl BilHeader {
    /// Parse header text. Keys are case-insensitive; unknown keys are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let entries: HashMap<String, &str> = text
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let key = parts.next()?;
                let value = parts.next()?;
                Some((key.to_ascii_uppercase(), value))
            })
            .collect();

        let nrows: usize = required(&entries, "NROWS")?;
        let ncols: usize = required(&entries, "NCOLS")?;
        let nbands: usize = optional(&entries, "NBANDS")?.unwrap_or(1);
        let nbits: usize = optional(&entries, "NBITS")?.unwrap_or(8);

        let big_endian = match entries.get("BYTEORDER").map(|v| v.to_ascii_uppercase()) {
            None => cfg!(target_endian = "big"),
            Some(v) if v == "I" || v == "L" => false,
            Some(v) if v == "M" || v == "B" => true,
            Some(v) => return Err(invalid("BYTEORDER", &v, "expected I or M")),
        };

        let pixel_type = match entries.get("PIXELTYPE").map(|v| v.to_ascii_uppercase()) {
            None => PixelType::Unsigned,
            Some(v) if v == "SIGNEDINT" => PixelType::Signed,
            Some(v) if v == "UNSIGNEDINT" => PixelType::Unsigned,
            Some(v) if v == "FLOAT" => PixelType::Float,
            Some(v) => return Err(invalid("PIXELTYPE", &v, "unknown pixel type")),
        };

        if let Some(layout) = entries.get("LAYOUT") {
            if !layout.eq_ignore_ascii_case("BIL") && nbands > 1 {
                return Err(Error::UnsupportedDataType(format!(
                    "{} layout with {} bands",
                    layout, nbands
                )));
            }
        }

        let band_row_bytes = optional(&entries, "BANDROWBYTES")?.unwrap_or(ncols * nbits / 8);
        let total_row_bytes = optional(&entries, "TOTALROWBYTES")?.unwrap_or(nbands * band_row_bytes);
        let xdim = optional(&entries, "XDIM")?.unwrap_or(1.0);
        let ydim = optional(&entries, "YDIM")?.unwrap_or(1.0);

        Ok(Self {
            nrows,
            ncols,
            nbands,
            nbits,
            big_endian,
            pixel_type,
            skip_bytes: optional(&entries, "SKIPBYTES")?.unwrap_or(0),
            band_row_bytes,
            total_row_bytes,
            ulxmap: optional(&entries, "ULXMAP")?.unwrap_or(0.0),
            ulymap: optional(&entries, "ULYMAP")?.unwrap_or((nrows as f64 - 1.0) * ydim),
            xdim,
            ydim,
            nodata: optional(&entries, "NODATA")?,
        })
    }

    /// Read and parse a `.hdr` file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn transform(&self) -> GeoTransform {
        GeoTransform::from_cell_centre(self.ulxmap, self.ulymap, self.xdim, self.ydim)
    }

    fn bytes_per_cell(&self) -> usize {
        self.nbits / 8
    }
}

fn required<T: std::str::FromStr>(entries: &HashMap<String, &str>, key: &'static str) -> Result<T> {
    optional(entries, key)?
        .ok_or_else(|| invalid(key, "", "missing from header"))
}

fn optional<T: std::str::FromStr>(
    entries: &HashMap<String, &str>,
    key: &'static str,
) -> Result<Option<T>> {
    entries
        .get(key)
        .map(|v| v.parse().map_err(|_| invalid(key, v, "cannot parse value")))
        .transpose()
}

fn invalid(name: &'static str, value: &str, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Read the first band of a BIL grid.
///
/// The `.hdr` is looked up next to `path`; a `.prj` is used for the CRS when
/// present, otherwise WGS84 is assumed as for all HydroSHEDS products.
pub fn read_bil(path: impl AsRef<Path>) -> Result<Raster<f64>> {
    let path = path.as_ref();
    let header = BilHeader::read(path.with_extension("hdr"))?;
    let data = std::fs::read(path)?;

    let values = if header.big_endian {
        decode_band::<BigEndian>(&header, &data)?
    } else {
        decode_band::<LittleEndian>(&header, &data)?
    };

    let mut raster = Raster::from_vec(values, header.nrows, header.ncols)?;
    raster.set_transform(header.transform());
    raster.set_nodata(header.nodata);
    let crs = CRS::from_prj_file(path.with_extension("prj"))?.unwrap_or_default();
    raster.set_crs(Some(crs));
    Ok(raster)
}

fn decode_band<B: ByteOrder>(header: &BilHeader, data: &[u8]) -> Result<Vec<f64>> {
    let decode: fn(&[u8]) -> f64 = match (header.pixel_type, header.nbits) {
        (PixelType::Unsigned, 8) => |b| f64::from(b[0]),
        (PixelType::Signed, 8) => |b| f64::from(b[0] as i8),
        (PixelType::Unsigned, 16) => |b| f64::from(B::read_u16(b)),
        (PixelType::Signed, 16) => |b| f64::from(B::read_i16(b)),
        (PixelType::Unsigned, 32) => |b| f64::from(B::read_u32(b)),
        (PixelType::Signed, 32) => |b| f64::from(B::read_i32(b)),
        (PixelType::Float, 32) => |b| f64::from(B::read_f32(b)),
        (pixel_type, nbits) => {
            return Err(Error::UnsupportedDataType(format!(
                "{:?} cells of {} bits",
                pixel_type, nbits
            )))
        }
    };

    let cell = header.bytes_per_cell();
    let row_len = header.ncols * cell;
    let needed = header.skip_bytes
        + header.nrows.saturating_sub(1) * header.total_row_bytes
        + row_len;
    if header.nrows > 0 && data.len() < needed {
        return Err(Error::Other(format!(
            "BIL data truncated: {} bytes, header requires {}",
            data.len(),
            needed
        )));
    }

    let mut values = Vec::with_capacity(header.nrows * header.ncols);
    for row in 0..header.nrows {
        let start = header.skip_bytes + row * header.total_row_bytes;
        values.extend(data[start..start + row_len].chunks_exact(cell).map(decode));
    }
    Ok(values)
}

fn dem_path(dir: &Path, region: &str, resolution: &str) -> PathBuf {
    dir.join(format!("{}_dem_{}.bil", region, resolution))
}

/// Load a HydroSHEDS DEM, `{region}_dem_{resolution}.bil`.
///
/// The returned raster carries the transform, CRS and no-data value;
/// `bounds()` and `valid_mask()` give the extent and data mask.
pub fn load_hydrosheds_dem(
    dir: impl AsRef<Path>,
    region: &str,
    resolution: &str,
) -> Result<Raster<f64>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound(dir.to_path_buf()));
    }
    let path = dem_path(dir, region, resolution);
    if !path.exists() {
        return Err(Error::DemNotFound {
            region: region.to_string(),
            resolution: resolution.to_string(),
            path,
        });
    }
    info!("Loading hydrosheds DEM region: {}; resolution: {}", region, resolution);
    read_bil(path)
}

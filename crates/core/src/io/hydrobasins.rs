//! HydroBASINS shapefile loader
//!
//! HydroBASINS ships one shapefile per region and level, named
//! `hybas_{region}_lev{level:02}_v1c.shp` with `.dbf` attributes and a
//! `.prj` reference system alongside.

use crate::basin::{BasinRecord, BasinTable, LevelBatch};
use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::pfaf::PfafCode;
use geo_types::{LineString, MultiPolygon, Polygon};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Every level HydroBASINS provides
pub const ALL_LEVELS: RangeInclusive<u8> = 1..=12;

/// Path of the shapefile for one region and level
pub fn hydrobasins_path(dir: impl AsRef<Path>, region: &str, level: u8) -> PathBuf {
    dir.as_ref()
        .join(format!("hybas_{}_lev{:02}_v1c.shp", region, level))
}

/// Load the given levels of one region into a single table.
///
/// # Errors
///
/// - [`Error::DirectoryNotFound`] if `dir` does not exist
/// - [`Error::RegionNotFound`] if a level's `.shp` or `.dbf` is missing
/// - [`Error::InconsistentReferenceSystem`] if the levels' `.prj` files disagree
pub fn load_hydrobasins<I>(dir: impl AsRef<Path>, region: &str, levels: I) -> Result<BasinTable>
where
    I: IntoIterator<Item = u8>,
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound(dir.to_path_buf()));
    }

    let batches = levels
        .into_iter()
        .map(|level| {
            info!("Loading hydrobasins region: {}; level: {}", region, level);
            let path = hydrobasins_path(dir, region, level);
            for required in [path.clone(), path.with_extension("dbf")] {
                if !required.exists() {
                    return Err(Error::RegionNotFound {
                        region: region.to_string(),
                        level,
                        path: required,
                    });
                }
            }
            read_level(&path, level)
        })
        .collect::<Result<Vec<_>>>()?;

    BasinTable::concat(batches)
}

/// Read one level's shapefile.
pub fn read_level(path: impl AsRef<Path>, level: u8) -> Result<LevelBatch> {
    let path = path.as_ref();
    let crs = CRS::from_prj_file(path.with_extension("prj"))?;
    let mut reader = shapefile::Reader::from_path(path)?;

    let mut records = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        let fields = Fields { record: &record, path };

        let pfaf = fields.id("PFAF_ID")?;
        let mut basin = BasinRecord::new(fields.id("HYBAS_ID")?, PfafCode::from_u64(pfaf), level)
            .with_next_down(fields.id("NEXT_DOWN")?)
            .with_main_basin(fields.id("MAIN_BAS")?)
            .with_sub_area(fields.number("SUB_AREA")?)
            .with_up_area(fields.number("UP_AREA")?)
            .with_dist_main(fields.number("DIST_MAIN")?)
            .with_geometry(to_multipolygon(shape, path)?);
        basin.next_sink = fields.optional_id("NEXT_SINK")?.unwrap_or(basin.hybas_id);
        basin.dist_sink = fields.optional_number("DIST_SINK")?.unwrap_or(0.0);
        basin.endo = fields.optional_id("ENDO")?.unwrap_or(0) as u8;
        basin.coast = fields.optional_id("COAST")?.unwrap_or(0) != 0;
        basin.order = match fields.optional_id("ORDER")? {
            Some(order) => order as u32,
            None => fields.optional_id("ORDER_")?.unwrap_or(0) as u32,
        };
        basin.sort = fields.optional_id("SORT")?.unwrap_or(0);
        records.push(basin);
    }

    debug!("{}: {} basins", path.display(), records.len());
    Ok(LevelBatch {
        level,
        records,
        crs,
    })
}

struct Fields<'a> {
    record: &'a Record,
    path: &'a Path,
}

impl Fields<'_> {
    fn optional_number(&self, name: &str) -> Result<Option<f64>> {
        let value = match self.record.get(name) {
            None => return Ok(None),
            Some(value) => value,
        };
        match value {
            FieldValue::Numeric(v) => Ok(*v),
            FieldValue::Float(v) => Ok(v.map(f64::from)),
            FieldValue::Double(v) => Ok(Some(*v)),
            FieldValue::Integer(v) => Ok(Some(f64::from(*v))),
            other => Err(Error::Shapefile(format!(
                "{}: field {} is not numeric: {:?}",
                self.path.display(),
                name,
                other
            ))),
        }
    }

    fn number(&self, name: &str) -> Result<f64> {
        self.optional_number(name)?.ok_or_else(|| {
            Error::Shapefile(format!("{}: missing field {}", self.path.display(), name))
        })
    }

    fn optional_id(&self, name: &str) -> Result<Option<u64>> {
        match self.optional_number(name)? {
            None => Ok(None),
            Some(v) if v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 => Ok(Some(v as u64)),
            Some(v) => Err(Error::Shapefile(format!(
                "{}: field {} holds {}, expected a non-negative integer",
                self.path.display(),
                name,
                v
            ))),
        }
    }

    fn id(&self, name: &str) -> Result<u64> {
        self.optional_id(name)?.ok_or_else(|| {
            Error::Shapefile(format!("{}: missing field {}", self.path.display(), name))
        })
    }
}

/// Inner rings belong to the outer ring preceding them.
fn to_multipolygon(shape: Shape, path: &Path) -> Result<MultiPolygon<f64>> {
    let polygon = match shape {
        Shape::Polygon(polygon) => polygon,
        Shape::NullShape => return Ok(MultiPolygon::new(Vec::new())),
        other => {
            return Err(Error::Shapefile(format!(
                "{}: expected polygons, found {:?}",
                path.display(),
                other.shapetype()
            )))
        }
    };

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    for ring in polygon.rings() {
        let (points, is_inner) = match ring {
            PolygonRing::Outer(points) => (points, false),
            PolygonRing::Inner(points) => (points, true),
        };
        let line: LineString<f64> = points.iter().map(|p| (p.x, p.y)).collect();
        match polygons.len() {
            n if is_inner && n > 0 => polygons[n - 1].interiors_push(line),
            _ => polygons.push(Polygon::new(line, Vec::new())),
        }
    }
    Ok(MultiPolygon::new(polygons))
}

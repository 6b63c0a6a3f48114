//! Loading a small HydroSHEDS region written to a temporary directory.

use basmati_core::io::{
    hydrobasins_path, load_hydrobasins, load_hydrosheds_dem, read_geotiff, write_geotiff,
    DEFAULT_DEM_RESOLUTION,
};
use basmati_core::pfaf::PfafCode;
use basmati_core::raster::Raster;
use basmati_core::{Error, CRS};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};
use std::path::Path;

const ESRI_WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

struct Basin {
    hybas_id: u64,
    next_down: u64,
    pfaf: u64,
    sub_area: f64,
    x0: f64,
}

fn field(name: &str) -> FieldName {
    FieldName::try_from(name).unwrap()
}

fn write_level(dir: &Path, level: u8, basins: &[Basin], prj: &str) {
    let path = hydrobasins_path(dir, "xx", level);
    let builder = TableWriterBuilder::new()
        .add_numeric_field(field("HYBAS_ID"), 11, 0)
        .add_numeric_field(field("NEXT_DOWN"), 11, 0)
        .add_numeric_field(field("MAIN_BAS"), 11, 0)
        .add_numeric_field(field("DIST_MAIN"), 10, 1)
        .add_numeric_field(field("SUB_AREA"), 10, 1)
        .add_numeric_field(field("UP_AREA"), 10, 1)
        .add_numeric_field(field("PFAF_ID"), 13, 0);
    let mut writer = shapefile::Writer::from_path(&path, builder).unwrap();

    for basin in basins {
        let polygon = Polygon::new(PolygonRing::Outer(vec![
            Point::new(basin.x0, 0.0),
            Point::new(basin.x0, 1.0),
            Point::new(basin.x0 + 1.0, 1.0),
            Point::new(basin.x0 + 1.0, 0.0),
            Point::new(basin.x0, 0.0),
        ]));
        let mut record = Record::default();
        let mut num = |name: &str, v: f64| {
            record.insert(name.to_string(), FieldValue::Numeric(Some(v)));
        };
        num("HYBAS_ID", basin.hybas_id as f64);
        num("NEXT_DOWN", basin.next_down as f64);
        num("MAIN_BAS", basin.hybas_id as f64);
        num("DIST_MAIN", 0.0);
        num("SUB_AREA", basin.sub_area);
        num("UP_AREA", basin.sub_area);
        num("PFAF_ID", basin.pfaf as f64);
        writer.write_shape_and_record(&polygon, &record).unwrap();
    }
    drop(writer);
    std::fs::write(path.with_extension("prj"), prj).unwrap();
}

fn write_region(dir: &Path) {
    write_level(
        dir,
        1,
        &[Basin { hybas_id: 1010, next_down: 0, pfaf: 1, sub_area: 300.0, x0: 0.0 }],
        ESRI_WGS84,
    );
    write_level(
        dir,
        2,
        &[
            Basin { hybas_id: 2010, next_down: 0, pfaf: 11, sub_area: 100.0, x0: 0.0 },
            Basin { hybas_id: 2020, next_down: 2010, pfaf: 12, sub_area: 120.0, x0: 1.0 },
            Basin { hybas_id: 2030, next_down: 2010, pfaf: 13, sub_area: 80.0, x0: 2.0 },
        ],
        ESRI_WGS84,
    );
}

#[test]
fn loads_levels_into_one_table() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path());

    let table = load_hydrobasins(dir.path(), "xx", [1, 2]).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.levels().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(table.crs().and_then(CRS::epsg), Some(4326));

    let row = table.find_pfaf(&12).unwrap();
    let rec = table.get(row).unwrap();
    assert_eq!(rec.hybas_id, 2020);
    assert_eq!(rec.level, 2);
    assert_eq!(rec.next_down(), Some(2010));
    assert_eq!(rec.pfaf(), &PfafCode::from(12u64));
    assert_eq!(rec.geometry.0.len(), 1);
    assert_eq!(table.inflow_rows(2, 2010).len(), 2);
}

#[test]
fn mismatched_reference_systems_fail() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path());
    let prj = hydrobasins_path(dir.path(), "xx", 2).with_extension("prj");
    std::fs::write(prj, r#"PROJCS["WGS 84 / UTM zone 33N",AUTHORITY["EPSG","32633"]]"#).unwrap();

    let err = load_hydrobasins(dir.path(), "xx", [1, 2]).unwrap_err();
    assert!(matches!(err, Error::InconsistentReferenceSystem { level: 2, .. }));
}

#[test]
fn missing_level_is_region_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path());
    let err = load_hydrobasins(dir.path(), "xx", [1, 2, 3]).unwrap_err();
    assert!(matches!(err, Error::RegionNotFound { level: 3, .. }));
}

#[test]
fn dem_to_geotiff() {
    let dir = tempfile::tempdir().unwrap();
    let bil = dir.path().join(format!("xx_dem_{}.bil", DEFAULT_DEM_RESOLUTION));
    std::fs::write(
        bil.with_extension("hdr"),
        "BYTEORDER I\nNROWS 2\nNCOLS 2\nNBITS 32\nPIXELTYPE FLOAT\nNODATA -9999\n\
         ULXMAP 0.25\nULYMAP 0.75\nXDIM 0.5\nYDIM 0.5\n",
    )
    .unwrap();
    let bytes: Vec<u8> = [10.0f32, 20.0, -9999.0, 40.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    std::fs::write(&bil, bytes).unwrap();

    let dem = load_hydrosheds_dem(dir.path(), "xx", DEFAULT_DEM_RESOLUTION).unwrap();
    assert_eq!(dem.bounds().right, 1.0);
    assert_eq!(dem.valid_mask().iter().filter(|&&v| v).count(), 3);

    let tif = dir.path().join("dem.tif");
    write_geotiff(&dem, &tif).unwrap();
    let back: Raster<f64> = read_geotiff(&tif).unwrap();
    assert_eq!(back.get(1, 1).unwrap(), 40.0);
    assert_eq!(back.transform(), dem.transform());
    assert!(back.is_nodata(back.get(1, 0).unwrap()));
}

//! Zonal statistics
//!
//! Computes statistics for each zone of an integer label raster, such as the
//! elevation range of every basin burnt in by
//! [`rasterize_basins`](crate::vector::rasterize_basins). Zone 0 is
//! unlabelled and skipped.

use basmati_core::raster::Raster;
use basmati_core::{Error, Result};
use std::collections::BTreeMap;

/// Result of zonal statistics for one zone
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalResult {
    pub zone_id: i32,
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Compute zonal statistics
///
/// For each zone in `zones`, computes statistics over the valid cells of
/// `values`. No-data values are skipped; a zone with no valid cells is
/// absent from the result.
///
/// # Returns
/// Map from zone id to [`ZonalResult`], ordered by zone id
pub fn zonal_statistics(
    values: &Raster<f64>,
    zones: &Raster<i32>,
) -> Result<BTreeMap<i32, ZonalResult>> {
    let (rows_v, cols_v) = values.shape();
    let (rows_z, cols_z) = zones.shape();

    if rows_v != rows_z || cols_v != cols_z {
        return Err(Error::SizeMismatch {
            er: rows_v,
            ec: cols_v,
            ar: rows_z,
            ac: cols_z,
        });
    }

    let mut zone_values: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for (&zone, &val) in zones.data().iter().zip(values.data().iter()) {
        if zone == 0 || values.is_nodata(val) {
            continue;
        }
        zone_values.entry(zone).or_default().push(val);
    }

    let results = zone_values
        .into_iter()
        .map(|(zone_id, vals)| {
            let count = vals.len();
            let sum: f64 = vals.iter().sum();
            let mean = sum / count as f64;
            let var = vals.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
            let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
            let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let result = ZonalResult {
                zone_id,
                count,
                sum,
                mean,
                std_dev: var.sqrt(),
                min,
                max,
            };
            (zone_id, result)
        })
        .collect();

    Ok(results)
}

//! Block-mean coarse graining

use basmati_core::raster::{GeoTransform, Raster};
use basmati_core::{Error, Result};
use ndarray::{s, Array2};

/// Average non-overlapping `grain.0` x `grain.1` blocks of cells.
///
/// No-data cells are left out of each block's mean; a block with no valid
/// cells becomes NaN, which is also the output's no-data value. The output
/// transform covers the same extent with cells `grain` times larger.
///
/// # Errors
///
/// [`Error::InvalidParameter`] if a grain size is zero or does not divide
/// the raster dimension exactly.
pub fn coarse_grain(raster: &Raster<f64>, grain: (usize, usize)) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();
    let (gr, gc) = grain;
    for (name, size, dim) in [("grain rows", gr, rows), ("grain cols", gc, cols)] {
        if size == 0 || dim % size != 0 {
            return Err(Error::InvalidParameter {
                name,
                value: size.to_string(),
                reason: format!("must divide the raster dimension {} exactly", dim),
            });
        }
    }

    let data = raster.data();
    let out = Array2::from_shape_fn((rows / gr, cols / gc), |(r, c)| {
        let block = data.slice(s![r * gr..(r + 1) * gr, c * gc..(c + 1) * gc]);
        let (sum, count) = block
            .iter()
            .filter(|&&v| !raster.is_nodata(v))
            .fold((0.0, 0usize), |(sum, n), &v| (sum + v, n + 1));
        if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        }
    });

    let gt = raster.transform();
    let mut output = Raster::from_array(out);
    output.set_transform(GeoTransform::new(
        gt.origin_x,
        gt.origin_y,
        gt.pixel_width * gc as f64,
        gt.pixel_height * gr as f64,
    ));
    output.set_crs(raster.crs().cloned());
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

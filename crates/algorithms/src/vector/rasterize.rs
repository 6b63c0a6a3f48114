//! Polygon rasterization
//!
//! Burns basin polygons into an integer label grid: a cell takes the 1-based
//! index of the polygon containing the cell centre, 0 where no polygon does.
//! A centre on the boundary counts as covered. When it lies on an edge or
//! vertex shared by several polygons, the first of them in input order keeps
//! the cell, so a partition leaves no gaps along its internal edges.

use crate::hierarchy::BasinView;
use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point};
use ndarray::Array2;
use basmati_core::raster::{Bounds, GeoTransform, Raster};
use basmati_core::{Error, Result};

/// Rasterize `geometries` onto a `rows` x `cols` grid.
///
/// # Errors
///
/// [`Error::OverlappingGeometries`] if a cell centre lies in the interior of
/// two geometries. A centre on one geometry's boundary and inside another's
/// interior goes to the interior claim.
pub fn rasterize<'g, I>(
    geometries: I,
    shape: (usize, usize),
    transform: &GeoTransform,
) -> Result<Raster<i32>>
where
    I: IntoIterator<Item = &'g MultiPolygon<f64>>,
{
    let (rows, cols) = shape;
    let mut output = Raster::<i32>::new(rows, cols);
    output.set_transform(*transform);
    output.set_nodata(Some(0));
    let labels = output.data_mut();
    // Whether the current label of a cell came from an interior hit
    let mut interior = Array2::<bool>::from_elem((rows, cols), false);

    for (index, geometry) in geometries.into_iter().enumerate() {
        let label = i32::try_from(index + 1).map_err(|_| Error::InvalidParameter {
            name: "geometries",
            value: (index + 1).to_string(),
            reason: "too many geometries for i32 labels".to_string(),
        })?;
        let Some(rect) = geometry.bounding_rect() else {
            continue;
        };
        let bounds = Bounds {
            left: rect.min().x,
            bottom: rect.min().y,
            right: rect.max().x,
            top: rect.max().y,
        };
        let (row_range, col_range) = transform.cell_window(&bounds, rows, cols);

        for row in row_range {
            for col in col_range.clone() {
                let (x, y) = transform.cell_centre(row, col);
                let centre = Point::new(x, y);
                if !geometry.intersects(&centre) {
                    continue;
                }
                let inside = geometry.contains(&centre);
                let cell = &mut labels[(row, col)];
                if *cell != 0 {
                    if !inside {
                        continue;
                    }
                    if interior[(row, col)] {
                        return Err(Error::OverlappingGeometries {
                            row,
                            col,
                            first: *cell as usize,
                            second: index + 1,
                        });
                    }
                }
                *cell = label;
                interior[(row, col)] = inside;
            }
        }
    }

    Ok(output)
}

/// Rasterize the basins of a query result in view order; label `i` is the
/// `i`-th basin of the view.
pub fn rasterize_basins(
    view: &BasinView<'_>,
    shape: (usize, usize),
    transform: &GeoTransform,
) -> Result<Raster<i32>> {
    let mut raster = rasterize(view.iter().map(|rec| &rec.geometry), shape, transform)?;
    raster.set_crs(view.table().crs().cloned());
    Ok(raster)
}

/// Keep the cells of `dem` labelled `label`, setting every other cell to
/// no-data.
pub fn mask_to_basin(dem: &Raster<f64>, labels: &Raster<i32>, label: i32) -> Result<Raster<f64>> {
    dem.masked(&labels.data().mapv(|v| v == label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use basmati_core::basin::{BasinRecord, BasinTable};
    use basmati_core::pfaf::PfafCode;
    use geo::{polygon, Polygon};

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        let p: Polygon<f64> = polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ];
        MultiPolygon::new(vec![p])
    }

    fn grid() -> GeoTransform {
        // 4 x 4 unit cells covering x 0..4, y 0..4
        GeoTransform::new(0.0, 4.0, 1.0, -1.0)
    }

    #[test]
    fn test_labels_in_input_order() {
        let geoms = [square(0.0, 2.0, 2.0), square(2.0, 0.0, 2.0)];
        let raster = rasterize(&geoms, (4, 4), &grid()).unwrap();
        // top-left quadrant is rows 0..2, cols 0..2
        assert_eq!(raster.get(0, 0).unwrap(), 1);
        assert_eq!(raster.get(1, 1).unwrap(), 1);
        assert_eq!(raster.get(3, 3).unwrap(), 2);
        assert_eq!(raster.get(0, 3).unwrap(), 0);
        assert_eq!(raster.data().iter().filter(|&&v| v == 2).count(), 4);
    }

    #[test]
    fn test_shared_edge_is_not_overlap() {
        let geoms = [square(0.0, 0.0, 2.0), square(2.0, 0.0, 2.0)];
        let raster = rasterize(&geoms, (4, 4), &grid()).unwrap();
        assert_eq!(raster.get(3, 1).unwrap(), 1);
        assert_eq!(raster.get(3, 2).unwrap(), 2);
    }

    #[test]
    fn test_centre_on_shared_edge_goes_to_first_polygon() {
        // cell centres at x = 0..=4, y = 0.5..=3.5; the shared edge x = 2
        // runs through the centres of column 2
        let transform = GeoTransform::new(-0.5, 4.0, 1.0, -1.0);
        let left: Polygon<f64> = polygon![
            (x: -0.5, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 4.0), (x: -0.5, y: 4.0), (x: -0.5, y: 0.0),
        ];
        let right: Polygon<f64> = polygon![
            (x: 2.0, y: 0.0), (x: 4.5, y: 0.0), (x: 4.5, y: 4.0), (x: 2.0, y: 4.0), (x: 2.0, y: 0.0),
        ];
        let geoms = [MultiPolygon::new(vec![left]), MultiPolygon::new(vec![right])];
        let raster = rasterize(&geoms, (4, 5), &transform).unwrap();

        for row in 0..4 {
            assert_eq!(raster.get(row, 2).unwrap(), 1);
            assert_eq!(raster.get(row, 3).unwrap(), 2);
        }
        assert!(raster.data().iter().all(|&v| v != 0));
        assert_eq!(raster.data().iter().filter(|&&v| v == 1).count(), 12);
    }

    #[test]
    fn test_boundary_claim_yields_to_interior() {
        // column 2 centres lie on the right edge of the first square and
        // inside the second
        let transform = GeoTransform::new(-0.5, 4.0, 1.0, -1.0);
        let geoms = [square(0.0, 0.0, 2.0), square(1.5, 0.0, 2.5)];
        let raster = rasterize(&geoms, (4, 5), &transform).unwrap();
        assert_eq!(raster.get(3, 1).unwrap(), 1);
        assert_eq!(raster.get(3, 2).unwrap(), 2);
    }

    #[test]
    fn test_overlap_is_error() {
        let geoms = [square(0.0, 0.0, 3.0), square(1.0, 1.0, 3.0)];
        match rasterize(&geoms, (4, 4), &grid()).unwrap_err() {
            Error::OverlappingGeometries { first, second, .. } => {
                assert_eq!((first, second), (1, 2));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_geometry_outside_grid() {
        let geoms = [square(10.0, 10.0, 2.0), MultiPolygon::new(Vec::new())];
        let raster = rasterize(&geoms, (4, 4), &grid()).unwrap();
        assert!(raster.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_basins_and_mask() {
        let table = BasinTable::new(
            vec![
                BasinRecord::new(1, PfafCode::from(11u64), 2).with_geometry(square(0.0, 0.0, 2.0)),
                BasinRecord::new(2, PfafCode::from(13u64), 2).with_geometry(square(2.0, 2.0, 2.0)),
            ],
            None,
        )
        .unwrap();
        let view = BasinView::new(&table, vec![1, 0]);
        let labels = rasterize_basins(&view, (4, 4), &grid()).unwrap();
        assert_eq!(labels.get(0, 3).unwrap(), 1);
        assert_eq!(labels.get(3, 0).unwrap(), 2);

        let mut dem = Raster::filled(4, 4, 100.0);
        dem.set_transform(grid());
        let masked = mask_to_basin(&dem, &labels, 2).unwrap();
        assert_eq!(masked.valid_mask().iter().filter(|&&v| v).count(), 4);
        assert_eq!(masked.get(3, 1).unwrap(), 100.0);
        assert!(masked.get(0, 0).unwrap().is_nan());
    }
}

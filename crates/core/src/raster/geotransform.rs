//! North-up affine georeferencing

use serde::{Deserialize, Serialize};

/// Geographic extent of a grid, in CRS units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }
}

/// Affine transformation for north-up grids.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `(origin_x, origin_y)` is the outer corner of the top-left cell and
/// `pixel_height` is negative. HydroSHEDS grids carry no rotation terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Build from a BIL header, whose `ULXMAP`/`ULYMAP` give the *centre* of
    /// the top-left cell and `XDIM`/`YDIM` are positive cell sizes.
    pub fn from_cell_centre(ulx: f64, uly: f64, xdim: f64, ydim: f64) -> Self {
        Self::new(ulx - xdim / 2.0, uly + ydim / 2.0, xdim, -ydim)
    }

    /// Build from GDAL order `[origin_x, pixel_width, 0, origin_y, 0, pixel_height]`.
    ///
    /// Returns `None` if the rotation terms are non-zero.
    pub fn from_gdal(coeffs: [f64; 6]) -> Option<Self> {
        if coeffs[2] != 0.0 || coeffs[4] != 0.0 {
            return None;
        }
        Some(Self::new(coeffs[0], coeffs[3], coeffs[1], coeffs[5]))
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_width, 0.0, self.origin_y, 0.0, self.pixel_height]
    }

    /// Geographic coordinates of the centre of cell `(row, col)`
    pub fn cell_centre(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Fractional `(row, col)` for a geographic coordinate
    pub fn geo_to_cell(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (y - self.origin_y) / self.pixel_height,
            (x - self.origin_x) / self.pixel_width,
        )
    }

    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Extent of a grid with `rows` x `cols` cells
    pub fn bounds(&self, rows: usize, cols: usize) -> Bounds {
        let x0 = self.origin_x;
        let x1 = self.origin_x + cols as f64 * self.pixel_width;
        let y0 = self.origin_y;
        let y1 = self.origin_y + rows as f64 * self.pixel_height;
        Bounds {
            left: x0.min(x1),
            bottom: y0.min(y1),
            right: x0.max(x1),
            top: y0.max(y1),
        }
    }

    /// Half-open row and column ranges of the cells whose centres may fall
    /// inside `bounds`, clipped to a `rows` x `cols` grid.
    pub fn cell_window(
        &self,
        bounds: &Bounds,
        rows: usize,
        cols: usize,
    ) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let (r0, c0) = self.geo_to_cell(bounds.left, bounds.top);
        let (r1, c1) = self.geo_to_cell(bounds.right, bounds.bottom);
        let clip = |a: f64, b: f64, n: usize| {
            let lo = (a.min(b) - 0.5).floor().max(0.0) as usize;
            let hi = ((a.max(b) - 0.5).ceil() + 1.0).max(0.0) as usize;
            lo.min(n)..hi.min(n)
        };
        (clip(r0, r1, rows), clip(c0, c1, cols))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

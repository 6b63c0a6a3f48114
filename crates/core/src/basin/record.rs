//! A single basin at one hierarchy level

use crate::pfaf::PfafCode;
use geo_types::MultiPolygon;
use serde::Serialize;

/// One basin polygon at one hierarchy level.
///
/// Field names follow the HydroBASINS attribute table. The Pfafstetter code
/// is fixed at construction so its string form cannot drift from the
/// integer it was read as.
#[derive(Debug, Clone, Serialize)]
pub struct BasinRecord {
    /// Identifier, unique within a level
    pub hybas_id: u64,
    /// `hybas_id` of the next basin downstream at the same level; 0 at a terminus
    pub next_down_id: u64,
    /// `hybas_id` of the next downstream sink (coast or endorheic sink)
    pub next_sink: u64,
    /// `hybas_id` of the outlet basin of the whole river system
    pub main_basin_id: u64,
    /// Flow distance to the sink, km
    pub dist_sink: f64,
    /// Flow distance to the main outlet, km
    pub dist_main: f64,
    /// Area of this basin alone, km²
    pub sub_area: f64,
    /// Total upstream area including this basin, km²
    pub up_area: f64,
    pfaf: PfafCode,
    /// Hierarchy depth, 1 = coarsest
    pub level: u8,
    /// 0 not endorheic, 1 endorheic, 2 endorheic sink
    pub endo: u8,
    /// True for small coastal basins grouped together
    pub coast: bool,
    /// Strahler-like order of the basin in its river system
    pub order: u32,
    /// Topological sort index within the region
    pub sort: u64,
    #[serde(skip_serializing)]
    pub geometry: MultiPolygon<f64>,
}

impl BasinRecord {
    /// Create a terminal basin with no area, distances or geometry.
    pub fn new(hybas_id: u64, pfaf: PfafCode, level: u8) -> Self {
        Self {
            hybas_id,
            next_down_id: 0,
            next_sink: hybas_id,
            main_basin_id: hybas_id,
            dist_sink: 0.0,
            dist_main: 0.0,
            sub_area: 0.0,
            up_area: 0.0,
            pfaf,
            level,
            endo: 0,
            coast: false,
            order: 0,
            sort: 0,
            geometry: MultiPolygon::new(Vec::new()),
        }
    }

    pub fn with_next_down(mut self, next_down_id: u64) -> Self {
        self.next_down_id = next_down_id;
        self
    }

    pub fn with_main_basin(mut self, main_basin_id: u64) -> Self {
        self.main_basin_id = main_basin_id;
        self
    }

    pub fn with_sub_area(mut self, sub_area: f64) -> Self {
        self.sub_area = sub_area;
        self
    }

    pub fn with_up_area(mut self, up_area: f64) -> Self {
        self.up_area = up_area;
        self
    }

    pub fn with_dist_main(mut self, dist_main: f64) -> Self {
        self.dist_main = dist_main;
        self
    }

    pub fn with_geometry(mut self, geometry: MultiPolygon<f64>) -> Self {
        self.geometry = geometry;
        self
    }

    /// The Pfafstetter code
    pub fn pfaf(&self) -> &PfafCode {
        &self.pfaf
    }

    /// Integer form of the Pfafstetter code
    pub fn pfaf_id(&self) -> Option<u64> {
        self.pfaf.to_u64()
    }

    /// String form of the Pfafstetter code, used for prefix matching
    pub fn pfaf_str(&self) -> &str {
        self.pfaf.as_str()
    }

    /// The next basin downstream, `None` at a coastal terminus or sink.
    pub fn next_down(&self) -> Option<u64> {
        (self.next_down_id != 0).then_some(self.next_down_id)
    }

    pub fn is_terminus(&self) -> bool {
        self.next_down_id == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminus() {
        let rec = BasinRecord::new(4010000010, PfafCode::from(4u64), 1);
        assert!(rec.is_terminus());
        assert_eq!(rec.next_down(), None);

        let rec = rec.with_next_down(4010000020);
        assert_eq!(rec.next_down(), Some(4010000020));
    }

    #[test]
    fn test_pfaf_forms_agree() {
        let rec = BasinRecord::new(1, PfafCode::from(4349u64), 4);
        assert_eq!(rec.pfaf_id(), Some(4349));
        assert_eq!(rec.pfaf_str(), "4349");
    }
}

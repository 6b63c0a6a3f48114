//! Non-nested basin selection by area
//!
//! Walks the levels from coarsest to finest and keeps every basin whose
//! `sub_area` lies in `[min_area, max_area]`, unless the basin one level
//! coarser that contains it was already taken into account. Coarse basins
//! win, so a basin and its immediate child are never both selected. Only the
//! immediate parent is consulted: when areas do not shrink down the
//! hierarchy, a basin can be selected below an out-of-range parent whose own
//! parent was selected.

use super::BasinView;
use basmati_core::basin::BasinTable;
use basmati_core::{Algorithm, Error, Result};
use std::collections::HashSet;

/// Parameters for area selection
#[derive(Debug, Clone, Copy)]
pub struct AreaSelectParams {
    /// Smallest accepted `sub_area`, inclusive
    pub min_area: f64,
    /// Largest accepted `sub_area`, inclusive
    pub max_area: f64,
}

impl Default for AreaSelectParams {
    fn default() -> Self {
        Self {
            min_area: 0.0,
            max_area: f64::INFINITY,
        }
    }
}

/// Area selection as an [`Algorithm`] producing an owned table
#[derive(Debug, Clone, Default)]
pub struct AreaSelect;

impl Algorithm for AreaSelect {
    type Input = BasinTable;
    type Output = BasinTable;
    type Params = AreaSelectParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "AreaSelect"
    }

    fn description(&self) -> &'static str {
        "Select basins by area across levels without nesting"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        area_select(&input, params.min_area, params.max_area)?.to_table()
    }
}

/// Select basins with `min_area <= sub_area <= max_area`, preferring coarser
/// levels.
///
/// A basin in range is skipped when its parent one level up is covered,
/// where covered means the parent was itself in range (selected, or skipped
/// for the same reason). Rows come out by ascending level, in table order
/// within a level.
///
/// # Errors
///
/// [`Error::InvalidParameter`] if a bound is NaN or `min_area > max_area`.
pub fn area_select(table: &BasinTable, min_area: f64, max_area: f64) -> Result<BasinView<'_>> {
    if min_area.is_nan() || max_area.is_nan() || min_area > max_area {
        return Err(Error::InvalidParameter {
            name: "min_area",
            value: format!("{}..={}", min_area, max_area),
            reason: "expected min_area <= max_area".to_string(),
        });
    }

    let records = table.records();
    let mut covered = HashSet::new();
    let mut selected = Vec::new();

    for level in table.levels() {
        for &row in table.level_rows(level) {
            let rec = &records[row];
            if rec.sub_area < min_area || rec.sub_area > max_area {
                continue;
            }
            let parent_covered = rec
                .pfaf()
                .parent()
                .and_then(|parent| table.row_by_pfaf(&parent))
                .is_some_and(|parent| covered.contains(&parent));
            covered.insert(row);
            if !parent_covered {
                selected.push(row);
            }
        }
    }

    Ok(BasinView::new(table, selected))
}

//! Basin hierarchy traversal
//!
//! Queries over a [`BasinTable`] that treat each level as a forest linked by
//! `next_down_id` pointers and the levels as a tree linked by Pfafstetter
//! code prefixes:
//!
//! - **downstream**: follow `next_down_id` from a basin to its coastal terminus
//! - **upstream**: every basin whose flow reaches a basin, breadth-first
//! - **levels**: the parent one level coarser, the children one level finer
//! - **area_select**: a non-nested selection of basins by area across levels
//!
//! All queries borrow the table and return a [`BasinView`]; none mutate it.

mod area_select;
mod downstream;
mod levels;
mod upstream;

pub use area_select::{area_select, AreaSelect, AreaSelectParams};
pub use downstream::{find_downstream, find_terminus};
pub use levels::{ancestors, find_next_level_larger, find_next_level_smaller};
pub use upstream::find_upstream;

use basmati_core::basin::{BasinRecord, BasinTable};
use basmati_core::pfaf::PfafCode;
use basmati_core::Result;

/// Rows of a borrowed table selected by a query.
#[derive(Debug, Clone)]
pub struct BasinView<'a> {
    table: &'a BasinTable,
    rows: Vec<usize>,
}

impl<'a> BasinView<'a> {
    pub fn new(table: &'a BasinTable, rows: Vec<usize>) -> Self {
        Self { table, rows }
    }

    pub fn empty(table: &'a BasinTable) -> Self {
        Self::new(table, Vec::new())
    }

    /// The table the rows index into
    pub fn table(&self) -> &'a BasinTable {
        self.table
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<usize> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Selected records, in query order
    pub fn iter(&self) -> impl Iterator<Item = &'a BasinRecord> + '_ {
        let records = self.table.records();
        self.rows.iter().map(move |&row| &records[row])
    }

    pub fn first(&self) -> Option<&'a BasinRecord> {
        self.rows.first().map(|&row| &self.table.records()[row])
    }

    pub fn last(&self) -> Option<&'a BasinRecord> {
        self.rows.last().map(|&row| &self.table.records()[row])
    }

    pub fn pfaf_codes(&self) -> Vec<&'a PfafCode> {
        self.iter().map(BasinRecord::pfaf).collect()
    }

    /// Sum of `sub_area` over the selection
    pub fn total_area(&self) -> f64 {
        self.iter().map(|rec| rec.sub_area).sum()
    }

    /// Copy the selected rows into a new table so further queries can run
    /// on the result alone.
    pub fn to_table(&self) -> Result<BasinTable> {
        self.table.select(&self.rows)
    }
}


#[cfg(test)]
mod tests {
    use super::fixture::{codes, sample};
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_accessors() {
        let table = sample();
        let view = BasinView::new(&table, vec![3, 1]);
        assert_eq!(view.len(), 2);
        assert_eq!(codes(&view), vec!["13", "11"]);
        assert_eq!(view.first().unwrap().hybas_id, 203);
        assert_eq!(view.last().unwrap().hybas_id, 201);
        assert_relative_eq!(view.total_area(), 500.0);
        assert!(BasinView::empty(&table).is_empty());
    }

    #[test]
    fn test_view_to_table() {
        let table = sample();
        let view = BasinView::new(&table, vec![4, 3, 0]);
        let owned = view.to_table().unwrap();
        assert_eq!(owned.len(), 3);
        assert_eq!(owned.levels().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(owned.row_by_hybas(2, 203), Some(1));
        assert_eq!(owned.inflow_rows(2, 203), &[0]);
    }
}

//! Upstream expansion over the inflow index

use super::BasinView;
use basmati_core::basin::BasinTable;
use basmati_core::pfaf::ToPfafCode;
use basmati_core::Result;
use std::collections::HashSet;

/// Every basin on the start basin's level whose flow eventually reaches it.
///
/// Breadth-first from the basins draining directly into `start`; rows come
/// out in discovery order and the start basin itself is not included.
/// Returns an empty view for a headwater basin.
pub fn find_upstream<'a, C>(table: &'a BasinTable, start: &C) -> Result<BasinView<'a>>
where
    C: ToPfafCode + ?Sized,
{
    let start_row = table.find_pfaf(start)?;
    let records = table.records();
    let level = records[start_row].level;

    let mut rows = Vec::new();
    let mut seen = HashSet::from([start_row]);
    let mut frontier = vec![start_row];

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for row in frontier {
            for &up in table.inflow_rows(level, records[row].hybas_id) {
                if seen.insert(up) {
                    rows.push(up);
                    next.push(up);
                }
            }
        }
        frontier = next;
    }

    Ok(BasinView::new(table, rows))
}

//! Downstream traversal along `next_down_id`

use super::BasinView;
use basmati_core::basin::BasinTable;
use basmati_core::pfaf::ToPfafCode;
use basmati_core::{Error, Result};
use std::collections::HashSet;

/// Basins from `start` to its coastal terminus, in flow order.
///
/// The walk stays on the start basin's level and ends at a `next_down_id`
/// of 0 or one that names no basin in the table. The result always begins
/// with the start basin; a start basin that is itself a terminus yields a
/// single row.
///
/// # Errors
///
/// - [`Error::BasinNotFound`] if no basin has the code `start`
/// - [`Error::DataInconsistency`] if the chain revisits a basin
pub fn find_downstream<'a, C>(table: &'a BasinTable, start: &C) -> Result<BasinView<'a>>
where
    C: ToPfafCode + ?Sized,
{
    let start_row = table.find_pfaf(start)?;
    let records = table.records();
    let level = records[start_row].level;

    let mut rows = vec![start_row];
    let mut visited = HashSet::from([start_row]);
    let mut current = start_row;

    while let Some(down) = records[current].next_down() {
        // (level, hybas_id) is unique per table, so this resolves to one row at most
        let Some(next) = table.row_by_hybas(level, down) else {
            break;
        };
        if !visited.insert(next) {
            return Err(Error::DataInconsistency(format!(
                "next_down_id chain from {} loops back to basin {}",
                records[start_row].pfaf(),
                records[next].hybas_id
            )));
        }
        rows.push(next);
        current = next;
    }

    Ok(BasinView::new(table, rows))
}

/// Row of the coastal basin that `start` finally drains into.
pub fn find_terminus<C>(table: &BasinTable, start: &C) -> Result<usize>
where
    C: ToPfafCode + ?Sized,
{
    let chain = find_downstream(table, start)?;
    chain
        .rows()
        .last()
        .copied()
        .ok_or_else(|| Error::Other("downstream chain is empty".to_string()))
}

//! Moving between hierarchy levels by Pfafstetter prefix

use super::BasinView;
use basmati_core::basin::BasinTable;
use basmati_core::pfaf::ToPfafCode;
use basmati_core::Result;

/// The basin one level coarser that contains `start`: the code with its
/// last digit dropped. Empty at the coarsest level present.
pub fn find_next_level_larger<'a, C>(table: &'a BasinTable, start: &C) -> Result<BasinView<'a>>
where
    C: ToPfafCode + ?Sized,
{
    let start_row = table.find_pfaf(start)?;
    let rows = table.records()[start_row]
        .pfaf()
        .parent()
        .and_then(|parent| table.row_by_pfaf(&parent))
        .into_iter()
        .collect();
    Ok(BasinView::new(table, rows))
}

/// The basins one level finer inside `start`, in table order.
pub fn find_next_level_smaller<'a, C>(table: &'a BasinTable, start: &C) -> Result<BasinView<'a>>
where
    C: ToPfafCode + ?Sized,
{
    let start_row = table.find_pfaf(start)?;
    let code = table.records()[start_row].pfaf();
    Ok(BasinView::new(table, table.child_rows(code).to_vec()))
}

/// Every coarser basin containing `start`, nearest first.
///
/// Stops at the first missing level, so a table that skips a level yields
/// only the ancestors below the gap.
pub fn ancestors<'a, C>(table: &'a BasinTable, start: &C) -> Result<BasinView<'a>>
where
    C: ToPfafCode + ?Sized,
{
    let start_row = table.find_pfaf(start)?;
    let mut rows = Vec::new();
    let mut code = table.records()[start_row].pfaf().parent();
    while let Some(row) = code.as_ref().and_then(|c| table.row_by_pfaf(c)) {
        rows.push(row);
        code = table.records()[row].pfaf().parent();
    }
    Ok(BasinView::new(table, rows))
}

#[cfg(test)]
mod tests {
    use super::super::fixture::{codes, sample};
    use super::*;
    use basmati_core::Error;

    #[test]
    fn test_larger() {
        let table = sample();
        assert_eq!(codes(&find_next_level_larger(&table, &132).unwrap()), vec!["13"]);
        assert_eq!(codes(&find_next_level_larger(&table, "13").unwrap()), vec!["1"]);
        assert!(find_next_level_larger(&table, &1).unwrap().is_empty());
    }

    #[test]
    fn test_smaller() {
        let table = sample();
        let view = find_next_level_smaller(&table, &13).unwrap();
        assert_eq!(codes(&view), vec!["131", "132", "133"]);
        assert!(view.iter().all(|r| r.level == 3));

        assert_eq!(find_next_level_smaller(&table, &1).unwrap().len(), 5);
        assert!(find_next_level_smaller(&table, &12).unwrap().is_empty());
        assert!(find_next_level_smaller(&table, &111).unwrap().is_empty());
    }

    #[test]
    fn test_ancestors() {
        let table = sample();
        assert_eq!(codes(&ancestors(&table, &133).unwrap()), vec!["13", "1"]);
        assert!(ancestors(&table, &1).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_start() {
        let table = sample();
        assert!(matches!(
            find_next_level_larger(&table, &134),
            Err(Error::BasinNotFound(_))
        ));
        assert!(matches!(
            find_next_level_smaller(&table, "1x"),
            Err(Error::InvalidPfafCode(_))
        ));
    }
}

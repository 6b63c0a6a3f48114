//! In-memory basin table with adjacency indices
//!
//! Indices are built once in [`BasinTable::new`]:
//!
//! - `(level, hybas_id)` → row, so following `next_down_id` is a lookup
//! - `(level, hybas_id)` → rows draining into it, for upstream expansion
//! - Pfafstetter code → row, and parent code → child rows one level finer
//!
//! Building them validates the invariants the traversals rely on, so a
//! table that constructs successfully never yields an ambiguous next-down
//! step.

use crate::basin::BasinRecord;
use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::pfaf::{PfafCode, ToPfafCode};
use std::collections::{BTreeMap, HashMap};

/// Records of one level as produced by a loader, with the reference
/// system they were stored in.
#[derive(Debug, Clone)]
pub struct LevelBatch {
    pub level: u8,
    pub records: Vec<BasinRecord>,
    pub crs: Option<CRS>,
}

/// Basins of one region across one or more levels.
///
/// Immutable once built: queries borrow it and return row indices.
#[derive(Debug, Clone)]
pub struct BasinTable {
    records: Vec<BasinRecord>,
    crs: Option<CRS>,
    by_id: HashMap<(u8, u64), usize>,
    inflows: HashMap<(u8, u64), Vec<usize>>,
    by_pfaf: HashMap<PfafCode, usize>,
    children: HashMap<PfafCode, Vec<usize>>,
    levels: BTreeMap<u8, Vec<usize>>,
}

impl BasinTable {
    /// Build a table and its indices.
    ///
    /// # Errors
    ///
    /// [`Error::DataInconsistency`] if a `hybas_id` repeats within a level,
    /// a Pfafstetter code repeats, or a code's digit count differs from its
    /// record's level.
    pub fn new(records: Vec<BasinRecord>, crs: Option<CRS>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_pfaf = HashMap::with_capacity(records.len());
        let mut inflows: HashMap<(u8, u64), Vec<usize>> = HashMap::new();
        let mut children: HashMap<PfafCode, Vec<usize>> = HashMap::new();
        let mut levels: BTreeMap<u8, Vec<usize>> = BTreeMap::new();

        for (row, rec) in records.iter().enumerate() {
            if rec.pfaf().len() != rec.level as usize {
                return Err(Error::DataInconsistency(format!(
                    "basin {} at level {} has Pfafstetter code {} with {} digits",
                    rec.hybas_id,
                    rec.level,
                    rec.pfaf(),
                    rec.pfaf().len()
                )));
            }
            if by_id.insert((rec.level, rec.hybas_id), row).is_some() {
                return Err(Error::DataInconsistency(format!(
                    "hybas_id {} appears more than once at level {}",
                    rec.hybas_id, rec.level
                )));
            }
            if by_pfaf.insert(rec.pfaf().clone(), row).is_some() {
                return Err(Error::DataInconsistency(format!(
                    "Pfafstetter code {} appears more than once",
                    rec.pfaf()
                )));
            }
            if let Some(down) = rec.next_down() {
                inflows.entry((rec.level, down)).or_default().push(row);
            }
            if let Some(parent) = rec.pfaf().parent() {
                children.entry(parent).or_default().push(row);
            }
            levels.entry(rec.level).or_default().push(row);
        }

        Ok(Self {
            records,
            crs,
            by_id,
            inflows,
            by_pfaf,
            children,
            levels,
        })
    }

    /// Merge per-level batches into one table, tagging each record with its
    /// batch level.
    ///
    /// # Errors
    ///
    /// [`Error::InconsistentReferenceSystem`] if the batches do not share one
    /// reference system, plus any error of [`BasinTable::new`].
    pub fn concat(batches: Vec<LevelBatch>) -> Result<Self> {
        let mut crs: Option<Option<CRS>> = None;
        let mut records = Vec::with_capacity(batches.iter().map(|b| b.records.len()).sum());

        for batch in batches {
            match &crs {
                None => crs = Some(batch.crs.clone()),
                Some(expected) => {
                    let same = match (expected, &batch.crs) {
                        (Some(a), Some(b)) => a.is_equivalent(b),
                        (None, None) => true,
                        _ => false,
                    };
                    if !same {
                        return Err(Error::InconsistentReferenceSystem {
                            level: batch.level,
                            expected: describe_crs(expected.as_ref()),
                            found: describe_crs(batch.crs.as_ref()),
                        });
                    }
                }
            }
            let level = batch.level;
            records.extend(batch.records.into_iter().map(|mut rec| {
                rec.level = level;
                rec
            }));
        }

        Self::new(records, crs.flatten())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[BasinRecord] {
        &self.records
    }

    pub fn get(&self, row: usize) -> Option<&BasinRecord> {
        self.records.get(row)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BasinRecord> {
        self.records.iter()
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Levels present, coarsest first
    pub fn levels(&self) -> impl Iterator<Item = u8> + '_ {
        self.levels.keys().copied()
    }

    /// Rows at `level`, in table order
    pub fn level_rows(&self, level: u8) -> &[usize] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_by_pfaf(&self, code: &PfafCode) -> Option<usize> {
        self.by_pfaf.get(code).copied()
    }

    /// Row of the basin with the given Pfafstetter code, given as an integer
    /// or a digit string.
    pub fn find_pfaf<C: ToPfafCode + ?Sized>(&self, code: &C) -> Result<usize> {
        let code = code.to_pfaf_code()?;
        self.row_by_pfaf(&code)
            .ok_or_else(|| Error::BasinNotFound(format!("Pfafstetter code {}", code)))
    }

    pub fn row_by_hybas(&self, level: u8, hybas_id: u64) -> Option<usize> {
        self.by_id.get(&(level, hybas_id)).copied()
    }

    /// Row of the basin with `hybas_id` at whichever level holds it.
    pub fn find_hybas(&self, hybas_id: u64) -> Result<usize> {
        let mut found = self
            .levels
            .keys()
            .filter_map(|&level| self.row_by_hybas(level, hybas_id));
        let row = found
            .next()
            .ok_or_else(|| Error::BasinNotFound(format!("hybas_id {}", hybas_id)))?;
        if found.next().is_some() {
            return Err(Error::DataInconsistency(format!(
                "hybas_id {} appears at more than one level",
                hybas_id
            )));
        }
        Ok(row)
    }

    /// Rows at `level` whose `next_down_id` is `hybas_id`
    pub fn inflow_rows(&self, level: u8, hybas_id: u64) -> &[usize] {
        self.inflows
            .get(&(level, hybas_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Rows one level finer whose code extends `code` by one digit
    pub fn child_rows(&self, code: &PfafCode) -> &[usize] {
        self.children.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Row maximising `key`, optionally restricted to one level.
    ///
    /// Ties keep the first row in table order.
    pub fn row_with_max<F>(&self, level: Option<u8>, key: F) -> Option<usize>
    where
        F: Fn(&BasinRecord) -> f64,
    {
        let rows: Box<dyn Iterator<Item = usize>> = match level {
            Some(level) => Box::new(self.level_rows(level).iter().copied()),
            None => Box::new(0..self.records.len()),
        };
        let mut best: Option<(usize, f64)> = None;
        for row in rows {
            let value = key(&self.records[row]);
            if best.map_or(true, |(_, b)| value > b) {
                best = Some((row, value));
            }
        }
        best.map(|(row, _)| row)
    }

    /// Copy the given rows, in the given order, into a new table.
    pub fn select(&self, rows: &[usize]) -> Result<Self> {
        let records = rows
            .iter()
            .map(|&row| {
                self.records.get(row).cloned().ok_or_else(|| {
                    Error::BasinNotFound(format!("row {} of a table of {}", row, self.len()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(records, self.crs.clone())
    }
}

impl<'a> IntoIterator for &'a BasinTable {
    type Item = &'a BasinRecord;
    type IntoIter = std::slice::Iter<'a, BasinRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn describe_crs(crs: Option<&CRS>) -> String {
    crs.map(CRS::identifier).unwrap_or_else(|| "no reference system".to_string())
}

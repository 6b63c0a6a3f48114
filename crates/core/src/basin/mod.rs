//! Basin records and the in-memory basin table
//!
//! A [`BasinTable`] holds basins of one region at one or more hierarchy
//! levels. The `next_down_id` pointers make each level a forest of trees
//! rooted at coastal basins; the Pfafstetter codes link the levels.

mod record;
mod table;

pub use record::BasinRecord;
pub use table::{BasinTable, LevelBatch};

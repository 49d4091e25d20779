//! Unit/Group entity storage.
//!
//! Re-architected per design note 9: `Campaign` owns a single arena keyed by
//! stable integer ids (`UnitId`, `GroupId`); name-indexed maps are secondary
//! lookups, never the primary storage. String sentinel tags in group names
//! (`__sg__`, `__spaa__`, `__mm__`, `__ig__`) are wire-format tags mirrored
//! into explicit [`GroupFlags`] at ingest so core logic never re-parses names.

pub mod group;
pub mod unit;

pub use group::{Group, GroupFlags};
pub use unit::Unit;

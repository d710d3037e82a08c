//! Tabular extraction report over the full corpus index.
//!
//! Unlike the composer's selective first-wins resolution, the report is
//! exhaustive: one row per indexed occurrence, duplicates included, so
//! conflicting archival copies stay visible.

pub mod report;
pub mod xlsx;

pub use report::{build_report, CuratedTitles};
pub use xlsx::{Cell, Sheet, Workbook};

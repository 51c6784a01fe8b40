//! Spreadsheet -> feature layer reconciliation
//!
//! Rows are expanded into point features, matched against an index of existing
//! layer records by `(date, region, city)`, and uploaded as adds or updates.

pub mod expand;
pub mod index;
pub mod pipeline;

pub use expand::{CategoryColumn, Expansion, RowLayout, expand, parse_decimal};
pub use index::{CompositeKey, RecordId, RemoteIndex, build_index};
pub use pipeline::{SyncPipeline, SyncReport, delete_all};

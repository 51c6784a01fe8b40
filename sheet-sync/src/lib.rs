//! Survey spreadsheet -> ArcGIS feature layer synchronization
//!
//! Rows of a Google Sheet are expanded into point features (one per counted
//! unit), matched against the layer by `(date, region, city)` and pushed as
//! adds or updates in one edit call.

pub mod arcgis;
pub mod cli;
pub mod config;
pub mod error;
pub mod spreadsheet;
pub mod sync;

pub use error::{Result, SyncError};

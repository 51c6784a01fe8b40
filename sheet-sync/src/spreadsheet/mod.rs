//! Google Sheets source
//!
//! Fetches survey sheets, turns them into a generic [`Dataset`] and checks the
//! columns against the configured sheet format.

pub mod dataset;
pub mod provider;
pub mod schema;
pub mod service;

#[cfg(test)]
pub mod testing;

pub use dataset::{Cell, Dataset, Row};
pub use provider::{CsvSheetProvider, GvizSheetProvider, SheetProvider};
pub use schema::{validate, validate_columns};
pub use service::SheetService;

//! Process configuration
//!
//! Settings come from the environment (optionally seeded from a `.env` file) and
//! are resolved once at startup. Sheet format files are loaded into immutable
//! structures before any sheet is fetched.

pub mod settings;
pub mod sheet_format;

pub use settings::Settings;
pub use sheet_format::{FieldFormat, SheetFormat, SheetFormats};

//! Column validation against sheet format config

use super::dataset::Dataset;
use crate::config::SheetFormats;
use crate::error::{Result, SyncError};

/// Check that `columns` is exactly the configured column set for `sheet`
///
/// Column order is not enforced, only set equality.
pub fn validate_columns(formats: &SheetFormats, sheet: &str, columns: &[String]) -> Result<()> {
    let format = formats
        .get(sheet)
        .ok_or_else(|| SyncError::UnknownSheet(sheet.to_string()))?;

    let mut expected: Vec<&str> = format.headers().collect();
    let mut actual: Vec<&str> = columns.iter().map(String::as_str).collect();
    expected.sort_unstable();
    expected.dedup();
    actual.sort_unstable();
    actual.dedup();

    if expected != actual {
        return Err(SyncError::schema_mismatch(expected, actual));
    }

    Ok(())
}

/// Validate a dataset and hand it back unchanged
pub fn validate(formats: &SheetFormats, sheet: &str, dataset: Dataset) -> Result<Dataset> {
    validate_columns(formats, sheet, dataset.columns())?;
    Ok(dataset)
}

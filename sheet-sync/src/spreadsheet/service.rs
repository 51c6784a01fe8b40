//! Sheet reading with format validation

use super::dataset::Dataset;
use super::provider::SheetProvider;
use super::schema;
use crate::config::{SheetFormat, SheetFormats};
use crate::error::{Result, SyncError};

/// Reads sheets through a provider and validates them against a format config
pub struct SheetService {
    provider: Box<dyn SheetProvider>,
    formats: SheetFormats,
}

impl SheetService {
    pub fn new(provider: impl SheetProvider + 'static, formats: SheetFormats) -> Self {
        Self {
            provider: Box::new(provider),
            formats,
        }
    }

    /// Configured format for a sheet
    pub fn format(&self, sheet: &str) -> Result<&SheetFormat> {
        self.formats
            .get(sheet)
            .ok_or_else(|| SyncError::UnknownSheet(sheet.to_string()))
    }

    /// Fetch a sheet and validate its columns
    ///
    /// Unknown sheets are rejected before any request is made.
    pub async fn read_sheet(&self, spreadsheet_id: &str, sheet: &str) -> Result<Dataset> {
        self.format(sheet)?;

        let dataset = self.provider.fetch(spreadsheet_id, sheet).await?;
        log::debug!(
            "Fetched sheet '{}': {} columns, {} rows",
            sheet,
            dataset.columns().len(),
            dataset.len()
        );

        schema::validate(&self.formats, sheet, dataset)
    }
}

//! Sheet -> feature layer pipelines
//!
//! One run: read and validate the sheet, index the layer, expand and classify
//! rows, upload. Steps run strictly in that order and any failure aborts the run.

use super::expand::{RowLayout, expand};
use super::index::build_index;
use crate::arcgis::FeatureLayer;
use crate::error::Result;
use crate::spreadsheet::SheetService;

/// Sheet read by the by-name pipeline
pub const DATA_SHEET_NAME: &str = "Дані";
/// Sheet read by the by-GID pipeline
pub const ZERO_SHEET_GID: &str = "0";

/// Outcome of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    /// False for dry runs and when there was nothing to submit
    pub uploaded: bool,
}

/// A configured sheet -> layer sync
pub struct SyncPipeline {
    service: SheetService,
    spreadsheet_id: String,
    sheet: String,
    wkid: u32,
    dry_run: bool,
}

impl SyncPipeline {
    pub fn new(
        service: SheetService,
        spreadsheet_id: impl Into<String>,
        sheet: impl Into<String>,
        wkid: u32,
    ) -> Self {
        Self {
            service,
            spreadsheet_id: spreadsheet_id.into(),
            sheet: sheet.into(),
            wkid,
            dry_run: false,
        }
    }

    /// Skip the upload step but do everything else
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self, layer: &dyn FeatureLayer) -> Result<SyncReport> {
        log::info!("Start updating feature layer from sheet '{}'", self.sheet);

        let dataset = self
            .service
            .read_sheet(&self.spreadsheet_id, &self.sheet)
            .await?;
        if dataset.is_empty() {
            log::warn!("Sheet '{}' has no data rows", self.sheet);
        }
        let layout = RowLayout::from_format(self.service.format(&self.sheet)?, self.wkid)?;

        let index = build_index(layer).await?;
        let expansion = expand(&dataset, &layout, &index, layer.object_id_field())?;

        log::info!("Items number to add: {}", expansion.add_count());
        log::info!("Items number to update: {}", expansion.update_count());

        let mut report = SyncReport {
            added: expansion.add_count(),
            updated: expansion.update_count(),
            uploaded: false,
        };

        if self.dry_run {
            log::info!("Dry run, nothing uploaded");
        } else if expansion.is_empty() {
            log::info!("No features to upload");
        } else {
            layer.upload(expansion.adds, expansion.updates).await?;
            report.uploaded = true;
        }

        log::info!("Finish updating feature layer from sheet '{}'", self.sheet);
        Ok(report)
    }
}

/// Remove every feature from the layer
pub async fn delete_all(layer: &dyn FeatureLayer) -> Result<()> {
    log::info!("Deleting all features from the feature layer");
    layer.delete_all().await
}

//! Sync command handlers

use anyhow::{Context, Result};
use std::time::Instant;

use super::SyncArgs;
use crate::arcgis::ArcGisClient;
use crate::config::{Settings, SheetFormats};
use crate::spreadsheet::{CsvSheetProvider, GvizSheetProvider, SheetService};
use crate::sync::pipeline::{DATA_SHEET_NAME, ZERO_SHEET_GID};
use crate::sync::{SyncPipeline, delete_all};

/// Which export a pipeline reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSource {
    /// gviz JSON export, sheet addressed by name
    ByName,
    /// CSV export, sheet addressed by GID
    ByGid,
}

impl SheetSource {
    pub fn sheet(&self) -> &'static str {
        match self {
            SheetSource::ByName => DATA_SHEET_NAME,
            SheetSource::ByGid => ZERO_SHEET_GID,
        }
    }

    fn build_service(&self, http: &reqwest::Client, settings: &Settings) -> Result<SheetService> {
        let service = match self {
            SheetSource::ByName => {
                let formats = SheetFormats::load(&settings.sheet_format_path)?;
                SheetService::new(GvizSheetProvider::new(http.clone()), formats)
            }
            SheetSource::ByGid => {
                let formats = SheetFormats::load(&settings.sheet_format_by_gid_path)?;
                SheetService::new(CsvSheetProvider::new(http.clone()), formats)
            }
        };
        Ok(service)
    }
}

/// Run one of the two upload pipelines
pub async fn handle_upload_command(
    settings: &Settings,
    http: reqwest::Client,
    source: SheetSource,
    args: SyncArgs,
) -> Result<()> {
    let spreadsheet_id = settings.require_spreadsheet_id()?;
    let sheet = source.sheet();

    // Format config is loaded before anything goes over the network
    let service = source
        .build_service(&http, settings)
        .context("Failed to load sheet format config")?;

    let start = Instant::now();

    let layer = ArcGisClient::connect(http, settings)
        .await
        .context("Failed to connect to the feature layer")?;

    let report = SyncPipeline::new(
        service,
        spreadsheet_id,
        sheet,
        settings.spatial_reference_wkid,
    )
    .dry_run(args.dry_run)
    .run(&layer)
    .await
    .with_context(|| format!("Sync of sheet '{}' failed", sheet))?;

    log::info!(
        "Sheet '{}' synced in {:.2}s: {} added, {} updated{}",
        sheet,
        start.elapsed().as_secs_f64(),
        report.added,
        report.updated,
        if report.uploaded { "" } else { " (not uploaded)" }
    );

    Ok(())
}

/// Delete every feature from the destination layer
pub async fn handle_delete_all_command(settings: &Settings, http: reqwest::Client) -> Result<()> {
    let layer = ArcGisClient::connect(http, settings)
        .await
        .context("Failed to connect to the feature layer")?;

    delete_all(&layer)
        .await
        .context("Failed to delete features")?;

    Ok(())
}

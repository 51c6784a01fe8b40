//! Command-line interface

pub mod commands;

use clap::{Parser, Subcommand};

use commands::sync::SyncArgs;

#[derive(Parser, Debug)]
#[command(
    name = "sheet-sync",
    version,
    about = "Synchronize survey spreadsheet rows into an ArcGIS feature layer"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Destination item id (overrides GIS_ITEM_ID)
    #[arg(long, global = true)]
    pub item_id: Option<String>,

    /// Source spreadsheet id (overrides OUTPUT_DATA_SPREADSHEET_ID)
    #[arg(long, global = true)]
    pub spreadsheet_id: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync the data sheet, addressed by sheet name (JSON export)
    Upload(SyncArgs),
    /// Sync the first sheet, addressed by GID (CSV export)
    UploadByGid(SyncArgs),
    /// Delete every feature from the destination layer
    DeleteAll,
}

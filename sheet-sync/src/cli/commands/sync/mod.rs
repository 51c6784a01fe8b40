//! Sync commands

pub mod handler;

use clap::Args;

pub use handler::{SheetSource, handle_delete_all_command, handle_upload_command};

#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncArgs {
    /// Fetch, validate and reconcile, but do not upload
    #[arg(long)]
    pub dry_run: bool,
}

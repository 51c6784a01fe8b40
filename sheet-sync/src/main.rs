use anyhow::{Context, Result};
use clap::Parser;

use sheet_sync::cli::commands::sync::{
    SheetSource, handle_delete_all_command, handle_upload_command,
};
use sheet_sync::cli::{Cli, Commands};
use sheet_sync::config::Settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A missing .env file is fine; real environment variables still apply
    dotenvy::dotenv().ok();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    match cli.command {
        Commands::Upload(args) => {
            handle_upload_command(&settings, http, SheetSource::ByName, args).await
        }
        Commands::UploadByGid(args) => {
            handle_upload_command(&settings, http, SheetSource::ByGid, args).await
        }
        Commands::DeleteAll => handle_delete_all_command(&settings, http).await,
    }
}

/// Environment settings with command-line overrides applied
fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = Settings::from_lookup(|key| {
        let overridden = match key {
            "GIS_ITEM_ID" => cli.item_id.clone(),
            "OUTPUT_DATA_SPREADSHEET_ID" => cli.spreadsheet_id.clone(),
            _ => None,
        };
        overridden.or_else(|| std::env::var(key).ok())
    })?;

    log::debug!(
        "Using portal {} and item {}",
        settings.gis_url,
        settings.gis_item_id
    );
    Ok(settings)
}

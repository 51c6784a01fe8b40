//! Spreadsheet export providers
//!
//! Two ways of pulling a sheet out of Google Sheets:
//! - [`GvizSheetProvider`] addresses the sheet by display name through the
//!   visualization (gviz) JSON endpoint
//! - [`CsvSheetProvider`] addresses the sheet by numeric GID through the CSV export

use async_trait::async_trait;
use serde::Deserialize;

use super::dataset::{Cell, Dataset};
use crate::error::{Result, SyncError};

/// Base URL shared by both export endpoints
pub const GOOGLE_SPREADSHEETS_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Fetches one sheet of a spreadsheet as a [`Dataset`]
#[async_trait]
pub trait SheetProvider: Send + Sync {
    /// `sheet` is a display name or a GID depending on the implementation
    async fn fetch(&self, spreadsheet_id: &str, sheet: &str) -> Result<Dataset>;
}

/// Sheet provider addressing sheets by display name (gviz JSON export)
#[derive(Debug, Clone)]
pub struct GvizSheetProvider {
    http: reqwest::Client,
    base_url: String,
}

impl GvizSheetProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, GOOGLE_SPREADSHEETS_URL)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn sheet_url(&self, spreadsheet_id: &str, sheet_name: &str) -> String {
        format!(
            "{}/{}/gviz/tq?tqx=out:json&sheet={}",
            self.base_url.trim_end_matches('/'),
            spreadsheet_id,
            urlencoding::encode(sheet_name)
        )
    }
}

#[async_trait]
impl SheetProvider for GvizSheetProvider {
    async fn fetch(&self, spreadsheet_id: &str, sheet: &str) -> Result<Dataset> {
        let url = self.sheet_url(spreadsheet_id, sheet);
        log::debug!("Fetching sheet '{}' from {}", sheet, url);

        let body = fetch_text(&self.http, &url).await?;
        parse_gviz_response(&body)
    }
}

/// Sheet provider addressing sheets by GID (CSV export)
#[derive(Debug, Clone)]
pub struct CsvSheetProvider {
    http: reqwest::Client,
    base_url: String,
}

impl CsvSheetProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, GOOGLE_SPREADSHEETS_URL)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn sheet_url(&self, spreadsheet_id: &str, gid: &str) -> String {
        format!(
            "{}/{}/export?format=csv&gid={}",
            self.base_url.trim_end_matches('/'),
            spreadsheet_id,
            urlencoding::encode(gid)
        )
    }
}

#[async_trait]
impl SheetProvider for CsvSheetProvider {
    async fn fetch(&self, spreadsheet_id: &str, sheet: &str) -> Result<Dataset> {
        let url = self.sheet_url(spreadsheet_id, sheet);
        log::debug!("Fetching sheet gid={} from {}", sheet, url);

        let body = fetch_text(&self.http, &url).await?;
        parse_csv(body.as_bytes())
    }
}

async fn fetch_text(http: &reqwest::Client, url: &str) -> Result<String> {
    let request_error = |source| SyncError::Request {
        url: url.to_string(),
        source,
    };

    http.get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(request_error)?
        .text()
        .await
        .map_err(request_error)
}

#[derive(Debug, Deserialize)]
struct GvizTable {
    cols: Vec<GvizColumn>,
    #[serde(default)]
    rows: Vec<GvizRow>,
}

#[derive(Debug, Deserialize)]
struct GvizColumn {
    #[serde(default)]
    label: String,
}

#[derive(Debug, Deserialize)]
struct GvizRow {
    #[serde(default)]
    c: Vec<Option<GvizCell>>,
}

#[derive(Debug, Deserialize)]
struct GvizCell {
    #[serde(default)]
    v: Option<serde_json::Value>,
    #[serde(default)]
    f: Option<String>,
}

impl GvizCell {
    /// Formatted display value wins over the raw value
    fn into_cell(self) -> Cell {
        match (self.f, self.v) {
            (Some(formatted), _) => Cell::Text(formatted),
            (None, Some(raw)) => Cell::from_json(&raw),
            (None, None) => Cell::Empty,
        }
    }
}

/// Parse a gviz `out:json` response body
///
/// The JSON object is wrapped in a JavaScript callback, e.g.
/// `/*O_o*/ google.visualization.Query.setResponse({...});`, so the payload is
/// taken from the first `{` to the last `}`.
pub fn parse_gviz_response(body: &str) -> Result<Dataset> {
    let (start, end) = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(SyncError::Decode(
                "response does not contain a JSON object".to_string(),
            ));
        }
    };

    let response: serde_json::Value = serde_json::from_str(&body[start..=end])
        .map_err(|e| SyncError::Decode(e.to_string()))?;

    let table = match response.get("table") {
        Some(table) => table.clone(),
        None => {
            let detail = response
                .get("errors")
                .map(|errors| errors.to_string())
                .unwrap_or_else(|| "missing 'table'".to_string());
            return Err(SyncError::Provider(format!(
                "unexpected gviz response: {}",
                detail
            )));
        }
    };

    let table: GvizTable = serde_json::from_value(table)
        .map_err(|e| SyncError::Provider(format!("malformed gviz table: {}", e)))?;

    let columns = table.cols.into_iter().map(|c| c.label).collect();
    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            row.c
                .into_iter()
                .map(|cell| cell.map(GvizCell::into_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(Dataset::new(columns, rows))
}

/// Parse a CSV export with a header row
pub fn parse_csv(body: &[u8]) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body);

    let columns = reader
        .headers()
        .map_err(|e| SyncError::Provider(format!("failed to read CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| SyncError::Provider(format!("failed to read CSV row {}: {}", i + 1, e)))?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(Dataset::new(columns, rows))
}

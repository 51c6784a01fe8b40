//! Error taxonomy for the sync pipelines
//!
//! Every failure aborts the current run. Nothing in the pipeline recovers locally;
//! the entry point logs the error and exits non-zero.

use std::collections::BTreeSet;

use thiserror::Error;

/// Errors raised while fetching, validating, reconciling or uploading survey data
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required setting is missing or a config file is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport or HTTP-status failure while fetching a sheet
    #[error("Sheet request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The sheet export could not be decoded as JSON
    #[error("Failed to decode sheet response: {0}")]
    Decode(String),

    /// Any other failure inside a sheet provider
    #[error("Sheet provider error: {0}")]
    Provider(String),

    /// The requested sheet has no entry in the sheet format config
    #[error("Sheet '{0}' doesn't exist in sheet format config")]
    UnknownSheet(String),

    /// The fetched columns differ from the configured ones
    #[error("Columns mismatch! Missing: {missing:?}, Extra: {extra:?}")]
    SchemaMismatch {
        missing: BTreeSet<String>,
        extra: BTreeSet<String>,
    },

    /// A row holds a value that should be numeric but is not
    #[error("Row {row}: column '{column}' has non-numeric value '{value}'")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    /// The feature layer item, its metadata or an access token could not be obtained
    #[error("Feature layer error: {0}")]
    Layer(String),

    /// Querying existing records from the feature layer failed
    #[error("Failed to query feature layer: {0}")]
    Query(String),

    /// Submitting adds/updates to the feature layer failed
    #[error("Failed to upload features: {0}")]
    Upload(String),

    /// Deleting features from the feature layer failed
    #[error("Failed to delete features: {0}")]
    Delete(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Build a schema mismatch from the expected and actual column lists
    pub fn schema_mismatch<'a>(
        expected: impl IntoIterator<Item = &'a str>,
        actual: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let expected: BTreeSet<String> = expected.into_iter().map(str::to_string).collect();
        let actual: BTreeSet<String> = actual.into_iter().map(str::to_string).collect();

        SyncError::SchemaMismatch {
            missing: expected.difference(&actual).cloned().collect(),
            extra: actual.difference(&expected).cloned().collect(),
        }
    }
}

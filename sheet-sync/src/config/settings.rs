//! Environment-backed settings

use std::path::PathBuf;

use crate::arcgis::constants::DEFAULT_WKID;
use crate::error::{Result, SyncError};

/// Default ArcGIS portal when `GIS_URL` is unset
pub const DEFAULT_GIS_URL: &str = "https://www.arcgis.com";

pub const DEFAULT_SHEET_FORMAT_PATH: &str = "sheet_formats/sheet_format.json";
pub const DEFAULT_SHEET_FORMAT_BY_GID_PATH: &str = "sheet_formats/sheet_format_by_gid.json";

/// Resolved process settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Portal URL used for token generation and item lookup
    pub gis_url: String,
    pub gis_username: Option<String>,
    pub gis_password: Option<String>,
    /// Item id of the destination feature layer (required)
    pub gis_item_id: String,
    /// Source spreadsheet id; only required by the upload pipelines
    pub spreadsheet_id: Option<String>,
    pub sheet_format_path: PathBuf,
    pub sheet_format_by_gid_path: PathBuf,
    /// WKID attached to every uploaded point
    pub spatial_reference_wkid: u32,
}

impl Settings {
    /// Load settings from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let gis_item_id = get("GIS_ITEM_ID").ok_or_else(|| {
            SyncError::Configuration("GIS_ITEM_ID is not set".to_string())
        })?;

        let spatial_reference_wkid = match get("SPATIAL_REFERENCE_WKID") {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                SyncError::Configuration(format!(
                    "SPATIAL_REFERENCE_WKID must be a positive integer, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_WKID,
        };

        Ok(Self {
            gis_url: get("GIS_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GIS_URL.to_string()),
            gis_username: get("GIS_USERNAME"),
            gis_password: get("GIS_PASSWORD"),
            gis_item_id,
            spreadsheet_id: get("OUTPUT_DATA_SPREADSHEET_ID"),
            sheet_format_path: get("SHEET_FORMAT_PATH")
                .unwrap_or_else(|| DEFAULT_SHEET_FORMAT_PATH.to_string())
                .into(),
            sheet_format_by_gid_path: get("SHEET_FORMAT_BY_GID_PATH")
                .unwrap_or_else(|| DEFAULT_SHEET_FORMAT_BY_GID_PATH.to_string())
                .into(),
            spatial_reference_wkid,
        })
    }

    /// The source spreadsheet id, or a configuration error if it was never provided
    pub fn require_spreadsheet_id(&self) -> Result<&str> {
        self.spreadsheet_id.as_deref().ok_or_else(|| {
            SyncError::Configuration("OUTPUT_DATA_SPREADSHEET_ID is not set".to_string())
        })
    }

    /// Username and password, only when both are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.gis_username, &self.gis_password) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_item_id_is_fatal() {
        let err = Settings::from_lookup(lookup(&[("GIS_URL", "https://example.com")])).unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }

    #[test]
    fn test_blank_item_id_is_fatal() {
        let err = Settings::from_lookup(lookup(&[("GIS_ITEM_ID", "   ")])).unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("GIS_ITEM_ID", "abc123")])).unwrap();
        assert_eq!(settings.gis_url, DEFAULT_GIS_URL);
        assert_eq!(settings.gis_item_id, "abc123");
        assert_eq!(settings.spatial_reference_wkid, DEFAULT_WKID);
        assert_eq!(settings.sheet_format_path, PathBuf::from(DEFAULT_SHEET_FORMAT_PATH));
        assert!(settings.credentials().is_none());
        assert!(settings.require_spreadsheet_id().is_err());
    }

    #[test]
    fn test_full_settings() {
        let settings = Settings::from_lookup(lookup(&[
            ("GIS_URL", "https://portal.example.com/"),
            ("GIS_USERNAME", "mapper"),
            ("GIS_PASSWORD", "secret"),
            ("GIS_ITEM_ID", "item"),
            ("OUTPUT_DATA_SPREADSHEET_ID", "sheet-id"),
            ("SPATIAL_REFERENCE_WKID", "3857"),
        ]))
        .unwrap();

        assert_eq!(settings.gis_url, "https://portal.example.com");
        assert_eq!(settings.credentials(), Some(("mapper", "secret")));
        assert_eq!(settings.require_spreadsheet_id().unwrap(), "sheet-id");
        assert_eq!(settings.spatial_reference_wkid, 3857);
    }

    #[test]
    fn test_username_without_password_is_anonymous() {
        let settings = Settings::from_lookup(lookup(&[
            ("GIS_ITEM_ID", "item"),
            ("GIS_USERNAME", "mapper"),
        ]))
        .unwrap();
        assert!(settings.credentials().is_none());
    }

    #[test]
    fn test_invalid_wkid() {
        let err = Settings::from_lookup(lookup(&[
            ("GIS_ITEM_ID", "item"),
            ("SPATIAL_REFERENCE_WKID", "wgs84"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }
}

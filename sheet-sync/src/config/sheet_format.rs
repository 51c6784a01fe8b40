//! Sheet format config files
//!
//! A format file maps a sheet selector (a sheet name or a GID) to an ordered
//! mapping of internal field name -> expected column header:
//!
//! ```json
//! { "Дані": { "date": "Дата", "region": "Область", "city": "Місто", ... } }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SyncError};

/// One configured column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFormat {
    /// Internal field name (the JSON key)
    pub name: String,
    /// Column header expected in the sheet
    pub header: String,
}

/// Ordered column layout of a single sheet
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct SheetFormat {
    fields: Vec<FieldFormat>,
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for SheetFormat {
    type Error = String;

    fn try_from(map: serde_json::Map<String, serde_json::Value>) -> std::result::Result<Self, Self::Error> {
        let fields = map
            .into_iter()
            .map(|(name, header)| match header {
                serde_json::Value::String(header) => Ok(FieldFormat { name, header }),
                other => Err(format!(
                    "header for field '{}' must be a string, got {}",
                    name, other
                )),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { fields })
    }
}

impl SheetFormat {
    pub fn new<N, H>(fields: impl IntoIterator<Item = (N, H)>) -> Self
    where
        N: Into<String>,
        H: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, header)| FieldFormat {
                    name: name.into(),
                    header: header.into(),
                })
                .collect(),
        }
    }

    pub fn fields(&self) -> &[FieldFormat] {
        &self.fields
    }

    /// Expected headers in configured order
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.header.as_str())
    }

    /// Header configured for an internal field name
    pub fn header_for(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.header.as_str())
    }
}

/// All sheet formats from one config file, keyed by sheet selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SheetFormats {
    sheets: HashMap<String, SheetFormat>,
}

impl SheetFormats {
    /// Read and parse a format file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Configuration(format!(
                "Failed to read sheet format file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let formats = Self::from_json(&content).map_err(|e| match e {
            SyncError::Configuration(msg) => {
                SyncError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        log::debug!(
            "Loaded {} sheet format(s) from {}",
            formats.sheets.len(),
            path.display()
        );
        Ok(formats)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            SyncError::Configuration(format!("Invalid sheet format config: {}", e))
        })
    }

    pub fn get(&self, sheet: &str) -> Option<&SheetFormat> {
        self.sheets.get(sheet)
    }

    pub fn contains(&self, sheet: &str) -> bool {
        self.sheets.contains_key(sheet)
    }

    pub fn insert(&mut self, sheet: impl Into<String>, format: SheetFormat) {
        self.sheets.insert(sheet.into(), format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"{
        "Дані": {
            "date": "Дата",
            "region": "Область",
            "city": "Місто",
            "long": "long",
            "lat": "lat",
            "kind_2": "Тип 2",
            "kind_1": "Тип 1"
        }
    }"#;

    #[test]
    fn test_parse_preserves_order() {
        let formats = SheetFormats::from_json(CONFIG).unwrap();
        let format = formats.get("Дані").unwrap();

        let headers: Vec<&str> = format.headers().collect();
        assert_eq!(
            headers,
            vec!["Дата", "Область", "Місто", "long", "lat", "Тип 2", "Тип 1"]
        );
        assert_eq!(format.header_for("city"), Some("Місто"));
        assert_eq!(format.header_for("missing"), None);
    }

    #[test]
    fn test_non_string_header_rejected() {
        let err = SheetFormats::from_json(r#"{"0": {"date": 5}}"#).unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let formats = SheetFormats::load(file.path()).unwrap();
        assert!(formats.contains("Дані"));
        assert!(!formats.contains("0"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SheetFormats::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }
}

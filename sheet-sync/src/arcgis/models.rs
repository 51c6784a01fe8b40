//! ArcGIS REST wire models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Spatial reference attached to a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

/// Point geometry in ArcGIS JSON form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "spatialReference")]
    pub spatial_reference: SpatialReference,
}

impl PointGeometry {
    pub fn new(x: f64, y: f64, wkid: u32) -> Self {
        Self {
            x,
            y,
            spatial_reference: SpatialReference { wkid },
        }
    }
}

/// One geometry + attribute record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<PointGeometry>,
}

impl Feature {
    pub fn new(attributes: Map<String, Value>, geometry: PointGeometry) -> Self {
        Self {
            attributes,
            geometry: Some(geometry),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Error object ArcGIS embeds in otherwise successful HTTP responses
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArcGisError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<Vec<String>>,
}

impl std::fmt::Display for ArcGisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = self.details.as_ref().filter(|d| !d.is_empty()) {
            write!(f, " ({})", details.join("; "))?;
        }
        Ok(())
    }
}

/// `{"error": {...}}` envelope check
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<ArcGisError>,
}

/// Response of `generateToken`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Portal item, as returned by `content/items/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ItemInfo {
    #[serde(default)]
    pub title: Option<String>,
    /// Feature service URL
    #[serde(default)]
    pub url: Option<String>,
}

/// Layer reference inside feature service metadata
#[derive(Debug, Clone, Deserialize)]
pub struct LayerRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Feature service metadata (`{service}?f=json`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub layers: Vec<LayerRef>,
}

/// Field description from layer metadata
#[derive(Debug, Clone, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
}

/// Layer metadata (`{layer}?f=json`)
#[derive(Debug, Clone, Deserialize)]
pub struct LayerInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "objectIdField", default)]
    pub object_id_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
}

impl LayerInfo {
    /// Explicit `objectIdField`, falling back to the first OID-typed field
    pub fn resolve_object_id_field(&self) -> Option<&str> {
        self.object_id_field.as_deref().or_else(|| {
            self.fields
                .iter()
                .find(|f| f.field_type == super::constants::OID_FIELD_TYPE)
                .map(|f| f.name.as_str())
        })
    }
}

/// Response of a layer `query`
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(rename = "exceededTransferLimit", default)]
    pub exceeded_transfer_limit: bool,
}

/// Outcome of a single add/update/delete
#[derive(Debug, Clone, Deserialize)]
pub struct EditResult {
    #[serde(rename = "objectId", default)]
    pub object_id: Option<i64>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<ArcGisError>,
}

/// Response of `applyEdits`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyEditsResponse {
    #[serde(rename = "addResults", default)]
    pub add_results: Vec<EditResult>,
    #[serde(rename = "updateResults", default)]
    pub update_results: Vec<EditResult>,
}

/// Response of `deleteFeatures`
///
/// Where-clause deletes report either per-record results or a single flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteResponse {
    #[serde(rename = "deleteResults", default)]
    pub delete_results: Vec<EditResult>,
    #[serde(default)]
    pub success: Option<bool>,
}

/// Collect the failed entries of an edit result list
pub fn failed_edits(results: &[EditResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| !r.success)
        .map(|r| match (&r.object_id, &r.error) {
            (Some(id), Some(err)) => format!("objectId {}: {}", id, err),
            (None, Some(err)) => err.to_string(),
            (Some(id), None) => format!("objectId {}: unknown error", id),
            (None, None) => "unknown error".to_string(),
        })
        .collect()
}

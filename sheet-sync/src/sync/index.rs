//! Index of existing layer records keyed by `(date, region, city)`

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::arcgis::constants::{ALL_RECORDS, CITY_FIELD, DATE_FIELD, REGION_FIELD};
use crate::arcgis::{Feature, FeatureLayer};
use crate::error::{Result, SyncError};

/// Layer object id
pub type RecordId = i64;

/// Natural key of a survey location on a given date
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    pub date: String,
    pub region: String,
    pub city: String,
}

impl CompositeKey {
    pub fn new(date: impl Into<String>, region: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            region: region.into(),
            city: city.into(),
        }
    }

    /// Key of a layer record, from its attributes
    pub fn from_attributes(feature: &Feature) -> Self {
        let text = |field: &str| feature.attribute(field).map(attribute_text).unwrap_or_default();
        Self::new(text(DATE_FIELD), text(REGION_FIELD), text(CITY_FIELD))
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.date, self.region, self.city)
    }
}

/// Render an attribute the way the sheet renders the same value
fn attribute_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read-only mapping of composite key -> object id for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteIndex {
    entries: HashMap<CompositeKey, RecordId>,
}

impl RemoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, returning the id it replaced
    pub fn insert(&mut self, key: CompositeKey, id: RecordId) -> Option<RecordId> {
        self.entries.insert(key, id)
    }

    pub fn get(&self, key: &CompositeKey) -> Option<RecordId> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &CompositeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the index from attribute-only layer records
    ///
    /// Records sharing a key overwrite earlier ones (last wins); every overwrite
    /// is logged.
    pub fn from_features(features: &[Feature], object_id_field: &str) -> Result<Self> {
        let mut index = Self::new();

        for feature in features {
            let id = feature
                .attribute(object_id_field)
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    SyncError::Query(format!(
                        "record without integer '{}' attribute: {:?}",
                        object_id_field, feature.attributes
                    ))
                })?;

            let key = CompositeKey::from_attributes(feature);
            if let Some(previous) = index.insert(key.clone(), id) {
                log::warn!(
                    "Duplicate key {} in feature layer: object id {} replaces {}",
                    key,
                    id,
                    previous
                );
            }
        }

        Ok(index)
    }
}

/// Query every layer record (attributes only) and index it by composite key
pub async fn build_index(layer: &dyn FeatureLayer) -> Result<RemoteIndex> {
    let object_id_field = layer.object_id_field();
    let out_fields = [object_id_field, DATE_FIELD, REGION_FIELD, CITY_FIELD];

    let features = layer.query(ALL_RECORDS, &out_fields, false).await?;
    let index = RemoteIndex::from_features(&features, object_id_field)?;
    if index.is_empty() {
        log::info!("Feature layer is empty, every row will be added");
    }

    log::info!(
        "Indexed {} existing record(s) under {} key(s)",
        features.len(),
        index.len()
    );
    Ok(index)
}

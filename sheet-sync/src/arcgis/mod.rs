//! ArcGIS feature layer access
//!
//! Thin client over the ArcGIS REST API: portal token and item lookup, layer
//! metadata, attribute queries, `applyEdits` and `deleteFeatures`.

pub mod client;
pub mod constants;
pub mod layer;
pub mod models;

#[cfg(test)]
pub mod testing;

pub use client::ArcGisClient;
pub use layer::FeatureLayer;
pub use models::{Feature, PointGeometry, SpatialReference};

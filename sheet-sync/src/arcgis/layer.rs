//! Feature layer capability used by the sync pipelines

use async_trait::async_trait;

use super::models::Feature;
use crate::error::Result;

/// Destination feature layer
///
/// Implemented by [`super::ArcGisClient`] for the real service and by in-memory
/// fakes in tests.
#[async_trait]
pub trait FeatureLayer: Send + Sync {
    /// Name of the object id field, discovered from layer metadata
    fn object_id_field(&self) -> &str;

    /// Return every record matching `where_clause`, exhausting server-side paging
    async fn query(
        &self,
        where_clause: &str,
        out_fields: &[&str],
        return_geometry: bool,
    ) -> Result<Vec<Feature>>;

    /// Submit adds and updates in a single edit call
    async fn upload(&self, adds: Option<Vec<Feature>>, updates: Option<Vec<Feature>>) -> Result<()>;

    /// Delete every feature in the layer
    async fn delete_all(&self) -> Result<()>;
}

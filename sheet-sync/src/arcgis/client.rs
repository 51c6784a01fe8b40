//! ArcGIS REST client for a single feature layer

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::header::REFERER;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::constants::{ALL_RECORDS, TOKEN_EXPIRATION_MINUTES};
use super::layer::FeatureLayer;
use super::models::{
    ApplyEditsResponse, DeleteResponse, ErrorEnvelope, Feature, ItemInfo, LayerInfo,
    QueryResponse, ServiceInfo, TokenResponse, failed_edits,
};
use crate::config::Settings;
use crate::error::{Result, SyncError};

/// Connected feature layer client
///
/// Created once per run through [`ArcGisClient::connect`], which resolves the
/// portal item to its first layer and discovers the object id field.
#[derive(Debug, Clone)]
pub struct ArcGisClient {
    http: reqwest::Client,
    layer_url: String,
    token: Option<PortalToken>,
    object_id_field: String,
}

/// Referer-bound portal token
///
/// The portal only honours the token on requests carrying the same `Referer`
/// it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PortalToken {
    value: String,
    referer: String,
}

impl ArcGisClient {
    /// Connect to the feature layer behind `settings.gis_item_id`
    pub async fn connect(http: reqwest::Client, settings: &Settings) -> Result<Self> {
        let portal = settings.gis_url.trim_end_matches('/');

        let token = match settings.credentials() {
            Some((username, password)) => {
                Some(generate_token(&http, portal, username, password).await?)
            }
            None => None,
        };

        let item_url = format!(
            "{}/sharing/rest/content/items/{}",
            portal, settings.gis_item_id
        );
        let item: ItemInfo = send_json(authorize(http.get(&item_url), token.as_ref()))
            .await
            .map_err(|e| {
                SyncError::Layer(format!(
                    "Failed to load item '{}': {}",
                    settings.gis_item_id, e
                ))
            })?;

        let service_url = item
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| SyncError::Layer("Feature Layer item not found".to_string()))?;

        let layer_url = if is_layer_url(&service_url) {
            service_url.trim_end_matches('/').to_string()
        } else {
            let service: ServiceInfo =
                send_json(authorize(http.get(&service_url), token.as_ref()))
                    .await
                    .map_err(|e| {
                        SyncError::Layer(format!(
                            "Failed to load feature service {}: {}",
                            service_url, e
                        ))
                    })?;
            first_layer_url(&service_url, &service)?
        };

        let info: LayerInfo = send_json(authorize(http.get(&layer_url), token.as_ref()))
            .await
            .map_err(|e| {
                SyncError::Layer(format!("Failed to load layer metadata {}: {}", layer_url, e))
            })?;

        let object_id_field = info
            .resolve_object_id_field()
            .ok_or_else(|| {
                SyncError::Layer(format!("Layer {} has no object id field", layer_url))
            })?
            .to_string();

        log::info!(
            "Connected to feature layer '{}' at {} (object id field: {})",
            info.name.as_deref().or(item.title.as_deref()).unwrap_or("unnamed"),
            layer_url,
            object_id_field
        );

        Ok(Self {
            http,
            layer_url,
            token,
            object_id_field,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        authorize(
            self.http.get(format!("{}/{}", self.layer_url, path)),
            self.token.as_ref(),
        )
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        authorize(
            self.http.post(format!("{}/{}", self.layer_url, path)),
            self.token.as_ref(),
        )
    }
}

#[async_trait]
impl FeatureLayer for ArcGisClient {
    fn object_id_field(&self) -> &str {
        &self.object_id_field
    }

    async fn query(
        &self,
        where_clause: &str,
        out_fields: &[&str],
        return_geometry: bool,
    ) -> Result<Vec<Feature>> {
        // Object ids drive the paging progress check, so they are always requested
        let mut fields = out_fields.to_vec();
        if !fields.contains(&"*") && !fields.contains(&self.object_id_field.as_str()) {
            fields.insert(0, self.object_id_field.as_str());
        }
        let out_fields = fields.join(",");
        let return_geometry = if return_geometry { "true" } else { "false" };
        let mut features: Vec<Feature> = Vec::new();
        let mut seen = HashSet::new();

        loop {
            let offset = features.len().to_string();
            let mut params = vec![
                ("where", where_clause),
                ("outFields", out_fields.as_str()),
                ("returnGeometry", return_geometry),
                ("orderByFields", self.object_id_field.as_str()),
            ];
            if !features.is_empty() {
                params.push(("resultOffset", offset.as_str()));
            }

            log::debug!("Querying {}/query at offset {}", self.layer_url, offset);
            let page: QueryResponse = send_json(self.get("query").query(&params))
                .await
                .map_err(SyncError::Query)?;

            let page_size = page.features.len();
            let mut fresh = 0;
            for feature in page.features {
                match feature.attribute(&self.object_id_field).and_then(Value::as_i64) {
                    Some(id) if !seen.insert(id) => continue,
                    Some(_) => fresh += 1,
                    None => {}
                }
                features.push(feature);
            }

            if !page.exceeded_transfer_limit || page_size == 0 {
                break;
            }

            // A layer without pagination support ignores resultOffset and keeps
            // serving the first page
            if fresh == 0 {
                return Err(SyncError::Query(format!(
                    "{} returned no new records at offset {}; the layer does not support paging",
                    self.layer_url, offset
                )));
            }
        }

        log::debug!("Query '{}' returned {} records", where_clause, features.len());
        Ok(features)
    }

    async fn upload(&self, adds: Option<Vec<Feature>>, updates: Option<Vec<Feature>>) -> Result<()> {
        if adds.is_none() && updates.is_none() {
            log::info!("Nothing to upload");
            return Ok(());
        }

        let encode = |features: &Vec<Feature>| {
            serde_json::to_string(features).map_err(|e| SyncError::Upload(e.to_string()))
        };

        let mut form = vec![("rollbackOnFailure", "true".to_string())];
        if let Some(adds) = &adds {
            form.push(("adds", encode(adds)?));
        }
        if let Some(updates) = &updates {
            form.push(("updates", encode(updates)?));
        }

        let response: ApplyEditsResponse = send_json(self.post("applyEdits").form(&form))
            .await
            .map_err(SyncError::Upload)?;

        let failures: Vec<String> = failed_edits(&response.add_results)
            .into_iter()
            .chain(failed_edits(&response.update_results))
            .collect();
        if !failures.is_empty() {
            return Err(SyncError::Upload(format!(
                "{} edit(s) rejected: {}",
                failures.len(),
                failures.join("; ")
            )));
        }

        log::info!(
            "Applied {} add(s) and {} update(s) to {}",
            response.add_results.len(),
            response.update_results.len(),
            self.layer_url
        );
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        let form = [("where", ALL_RECORDS), ("rollbackOnFailure", "true")];

        let response: DeleteResponse = send_json(self.post("deleteFeatures").form(&form))
            .await
            .map_err(SyncError::Delete)?;

        let failures = failed_edits(&response.delete_results);
        if response.success == Some(false) || !failures.is_empty() {
            return Err(SyncError::Delete(if failures.is_empty() {
                "server reported failure".to_string()
            } else {
                failures.join("; ")
            }));
        }

        log::info!(
            "Deleted {} feature(s) from {}",
            response.delete_results.len(),
            self.layer_url
        );
        Ok(())
    }
}

/// Request a short-lived token for named-user access
async fn generate_token(
    http: &reqwest::Client,
    portal: &str,
    username: &str,
    password: &str,
) -> Result<PortalToken> {
    let url = format!("{}/sharing/rest/generateToken", portal);
    let expiration = TOKEN_EXPIRATION_MINUTES.to_string();
    let form = [
        ("username", username),
        ("password", password),
        ("client", "referer"),
        ("referer", portal),
        ("expiration", expiration.as_str()),
        ("f", "json"),
    ];

    let response: TokenResponse = send_json(http.post(&url).form(&form))
        .await
        .map_err(|e| SyncError::Layer(format!("Failed to generate token: {}", e)))?;

    log::debug!("Generated portal token for '{}'", username);
    Ok(PortalToken {
        value: response.token,
        referer: portal.to_string(),
    })
}

fn authorize(
    request: reqwest::RequestBuilder,
    token: Option<&PortalToken>,
) -> reqwest::RequestBuilder {
    let request = request.query(&[("f", "json")]);
    match token {
        Some(token) => request
            .query(&[("token", token.value.as_str())])
            .header(REFERER, token.referer.as_str()),
        None => request,
    }
}

/// Send a request and decode the JSON body, surfacing ArcGIS error envelopes
///
/// ArcGIS reports most failures with an `error` object, usually under HTTP 200
/// and sometimes under an error status. The envelope is checked before the
/// status so its message is never lost.
async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> std::result::Result<T, String> {
    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| format!("failed to read response body: {}", e))?;

    let body: Value = match serde_json::from_str(&text) {
        Ok(body) => body,
        Err(_) if !status.is_success() => return Err(format!("HTTP {}", status)),
        Err(e) => return Err(format!("invalid JSON response: {}", e)),
    };

    if let Ok(ErrorEnvelope { error: Some(error) }) = ErrorEnvelope::deserialize(&body) {
        return Err(error.to_string());
    }
    if !status.is_success() {
        return Err(format!("HTTP {}", status));
    }

    serde_json::from_value(body).map_err(|e| format!("unexpected response: {}", e))
}

/// Whether a URL already addresses a layer (`.../FeatureServer/0`)
fn is_layer_url(url: &str) -> bool {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
}

fn first_layer_url(service_url: &str, service: &ServiceInfo) -> Result<String> {
    let layer = service.layers.first().ok_or_else(|| {
        SyncError::Layer(format!("Feature service {} has no layers", service_url))
    })?;
    Ok(format!("{}/{}", service_url.trim_end_matches('/'), layer.id))
}

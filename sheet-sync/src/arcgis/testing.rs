//! In-memory feature layer and a fake ArcGIS REST server for tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::layer::FeatureLayer;
use super::models::Feature;
use crate::error::{Result, SyncError};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub where_clause: String,
    pub out_fields: Vec<String>,
    pub return_geometry: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    pub adds: Option<Vec<Feature>>,
    pub updates: Option<Vec<Feature>>,
}

/// Feature layer keeping its records in memory
///
/// Adds get sequential object ids; updates replace the record with the same id.
pub struct MemoryLayer {
    object_id_field: String,
    records: Mutex<Vec<Feature>>,
    next_id: Mutex<i64>,
    queries: Mutex<Vec<RecordedQuery>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    fail_uploads: bool,
}

impl MemoryLayer {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<Feature>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|r| r.attribute("OBJECTID").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;

        Self {
            object_id_field: "OBJECTID".to_string(),
            records: Mutex::new(records),
            next_id: Mutex::new(next_id),
            queries: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            fail_uploads: false,
        }
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn records(&self) -> Vec<Feature> {
        self.records.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeatureLayer for MemoryLayer {
    fn object_id_field(&self) -> &str {
        &self.object_id_field
    }

    async fn query(
        &self,
        where_clause: &str,
        out_fields: &[&str],
        return_geometry: bool,
    ) -> Result<Vec<Feature>> {
        self.queries.lock().unwrap().push(RecordedQuery {
            where_clause: where_clause.to_string(),
            out_fields: out_fields.iter().map(|f| f.to_string()).collect(),
            return_geometry,
        });

        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .map(|record| {
                let attributes: Map<String, Value> = record
                    .attributes
                    .iter()
                    .filter(|(name, _)| out_fields.contains(&name.as_str()))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                Feature {
                    attributes,
                    geometry: if return_geometry { record.geometry.clone() } else { None },
                }
            })
            .collect())
    }

    async fn upload(&self, adds: Option<Vec<Feature>>, updates: Option<Vec<Feature>>) -> Result<()> {
        self.uploads.lock().unwrap().push(RecordedUpload {
            adds: adds.clone(),
            updates: updates.clone(),
        });

        if self.fail_uploads {
            return Err(SyncError::Upload("layer is read-only".to_string()));
        }

        let mut records = self.records.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();

        for mut feature in adds.unwrap_or_default() {
            feature.attributes.insert(self.object_id_field.clone(), json!(*next_id));
            *next_id += 1;
            records.push(feature);
        }

        for feature in updates.unwrap_or_default() {
            let id = feature.attribute(&self.object_id_field).cloned();
            if let Some(existing) = records
                .iter_mut()
                .find(|r| r.attribute(&self.object_id_field).cloned() == id)
            {
                *existing = feature;
            }
        }

        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        self.records.lock().unwrap().clear();
        Ok(())
    }
}

/// A request received by [`FakeServer`]
#[derive(Debug, Clone)]
pub struct FakeRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl FakeRequest {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, &name.to_ascii_lowercase())
    }

    /// Value of a field in a form-encoded body
    pub fn form_value(&self, key: &str) -> Option<String> {
        decode_pairs(&self.body)
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn decode_pairs(encoded: &str) -> Vec<(String, String)> {
    let decode = |s: &str| urlencoding::decode(&s.replace('+', " ")).unwrap().into_owned();
    encoded
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect()
}

type Responder = dyn Fn(&str, &FakeRequest) -> (u16, String) + Send + Sync;

/// Minimal HTTP/1.1 server answering every request with a canned JSON body
///
/// The responder gets the server's base URL and the request, and returns
/// `(status, body)`.
pub struct FakeServer {
    url: String,
    requests: Arc<Mutex<Vec<FakeRequest>>>,
}

impl FakeServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, &FakeRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let base = url.clone();
        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_connection(
                    stream,
                    base.clone(),
                    respond.clone(),
                    recorded.clone(),
                ));
            }
        });

        Self { url, requests }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<FakeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    base: String,
    respond: Arc<Responder>,
    requests: Arc<Mutex<Vec<FakeRequest>>>,
) {
    while let Ok(Some(request)) = read_request(&mut stream).await {
        let (status, body) = respond(&base, &request);
        requests.lock().unwrap().push(request);

        let response = format!(
            "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
            status,
            if status < 400 { "OK" } else { "Error" },
            body.len(),
            body
        );
        if stream.write_all(response.as_bytes()).await.is_err() {
            break;
        }
    }
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<FakeRequest>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default();
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let length: usize = lookup(&headers, "content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(Some(FakeRequest {
        method,
        path: path.to_string(),
        query: decode_pairs(query),
        body: String::from_utf8_lossy(&buf[header_end..header_end + length]).into_owned(),
        headers,
    }))
}

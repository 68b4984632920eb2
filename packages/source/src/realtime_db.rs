//! Realtime database reader.
//!
//! The database stores reports as an object keyed by push id. Reading the
//! REST form (`{database_url}/{path}.json`) returns that object, `null` when
//! the node is empty, or an array when the keys happen to be sequential
//! integers. The object keys are report ids; a child without an id field
//! of its own takes its key.

use async_trait::async_trait;
use basurant_report_models::Report;
use serde_json::Value;

use crate::retry::{self, RetryPolicy};
use crate::{ReportSource, SourceError, SourceKind, parse_reports};

#[derive(Debug, Clone)]
pub struct RealtimeDbSource {
    id: String,
    name: String,
    url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl RealtimeDbSource {
    #[must_use]
    pub fn new(
        id: &str,
        name: &str,
        database_url: &str,
        path: &str,
        client: reqwest::Client,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            url: snapshot_url(database_url, path),
            client,
            retry,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReportSource for RealtimeDbSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::RealtimeDb
    }

    async fn fetch(&self) -> Result<Vec<Report>, SourceError> {
        let snapshot = retry::send_json(self.retry, || self.client.get(&self.url)).await?;
        let reports = parse_reports(flatten_snapshot(snapshot));
        log::debug!("Fetched {} reports from {}", reports.len(), self.url);
        Ok(reports)
    }
}

/// Builds the REST URL of a database node.
#[must_use]
pub fn snapshot_url(database_url: &str, path: &str) -> String {
    format!(
        "{}/{}.json",
        database_url.trim_end_matches('/'),
        path.trim_matches('/')
    )
}

/// Flattens a node snapshot into its child values, dropping falsy ones
/// (`null`, `false`, `0`, `""`). Object children lacking an id are given
/// their key as `id`.
#[must_use]
pub fn flatten_snapshot(snapshot: Value) -> Vec<Value> {
    match snapshot {
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| is_truthy(v))
            .map(|(key, mut child)| {
                if let Value::Object(fields) = &mut child
                    && !has_id(fields)
                {
                    fields.insert("id".to_string(), Value::String(key));
                }
                child
            })
            .collect(),
        Value::Array(items) => items.into_iter().filter(is_truthy).collect(),
        _ => Vec::new(),
    }
}

fn has_id(fields: &serde_json::Map<String, Value>) -> bool {
    ["id", "reportId", "_id"]
        .iter()
        .any(|field| fields.get(*field).is_some_and(|v| !v.is_null()))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

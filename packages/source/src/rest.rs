//! JSON report API client.
//!
//! The API is reachable at several base URLs (same origin, then the two
//! development ports). Each operation walks the list until one answers.

use async_trait::async_trait;
use basurant_report_models::Report;
use basurant_report_models::id::is_valid_report_id;
use serde_json::Value;

use crate::retry::{self, RetryPolicy};
use crate::{ReportSource, SourceError, SourceKind, parse_reports};

/// A REST report collection (`GET`/`POST {endpoint}`, `GET {endpoint}/next-id`).
#[derive(Debug, Clone)]
pub struct RestSource {
    id: String,
    name: String,
    endpoints: Vec<String>,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl RestSource {
    #[must_use]
    pub fn new(
        id: &str,
        name: &str,
        endpoints: Vec<String>,
        client: reqwest::Client,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            endpoints,
            client,
            retry,
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Asks each endpoint for the next server-assigned id.
    ///
    /// Answers that are not `{ "id": "R-<13 digits>" }` are ignored. Returns
    /// `None` when no endpoint produced a valid id.
    pub async fn next_id(&self) -> Option<String> {
        for endpoint in &self.endpoints {
            let url = format!("{}/next-id", endpoint.trim_end_matches('/'));
            match retry::send_json(self.retry, || self.client.get(&url)).await {
                Ok(body) => {
                    if let Some(id) = next_id_from_payload(&body) {
                        return Some(id);
                    }
                    log::debug!("Ignoring malformed next-id answer from {url}: {body}");
                }
                Err(e) => log::debug!("next-id failed at {url}: {e}"),
            }
        }
        None
    }

    /// Posts a report to the first endpoint that accepts it.
    ///
    /// # Errors
    ///
    /// Returns the last endpoint's [`SourceError`] if none accepted it.
    pub async fn submit(&self, report: &Report) -> Result<String, SourceError> {
        let mut last_error = None;

        for endpoint in &self.endpoints {
            match retry::send(self.retry, || self.client.post(endpoint).json(report)).await {
                Ok(_) => {
                    log::info!("Saved report {} via {endpoint}", report.id);
                    return Ok(endpoint.clone());
                }
                Err(e) => {
                    log::debug!("Save failed at {endpoint}: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::Response {
            message: "Unable to save report to server".to_string(),
        }))
    }
}

#[async_trait]
impl ReportSource for RestSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Rest
    }

    async fn fetch(&self) -> Result<Vec<Report>, SourceError> {
        let mut last_error = None;

        for endpoint in &self.endpoints {
            match retry::send_json(self.retry, || self.client.get(endpoint)).await {
                Ok(body) => match reports_from_payload(body) {
                    Some(reports) => {
                        log::debug!("Fetched {} reports from {endpoint}", reports.len());
                        return Ok(reports);
                    }
                    None => {
                        log::debug!("{endpoint} answered without a reports array");
                        last_error = Some(SourceError::Response {
                            message: format!("{endpoint}: missing reports array"),
                        });
                    }
                },
                Err(e) => {
                    log::debug!("Fetch failed at {endpoint}: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::Response {
            message: format!("{}: no endpoints configured", self.id),
        }))
    }
}

/// Extracts `payload.reports`. Returns `None` when it is not an array.
#[must_use]
pub fn reports_from_payload(payload: Value) -> Option<Vec<Report>> {
    match payload {
        Value::Object(mut map) => match map.remove("reports") {
            Some(Value::Array(entries)) => Some(parse_reports(entries)),
            _ => None,
        },
        _ => None,
    }
}

/// Extracts a well-formed id from a next-id answer.
#[must_use]
pub fn next_id_from_payload(payload: &Value) -> Option<String> {
    payload
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| is_valid_report_id(id))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::retry::default_client;

    #[test]
    fn extracts_reports_array() {
        let reports =
            reports_from_payload(json!({"reports": [{"id": "R-1"}, {"nope": true}]})).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, "R-1");

        assert_eq!(reports_from_payload(json!({"reports": []})), Some(vec![]));
    }

    #[test]
    fn rejects_payload_without_array() {
        assert_eq!(reports_from_payload(json!({"reports": {"a": 1}})), None);
        assert_eq!(reports_from_payload(json!([{"id": "R-1"}])), None);
        assert_eq!(reports_from_payload(json!({})), None);
    }

    #[test]
    fn validates_next_id_answers() {
        assert_eq!(
            next_id_from_payload(&json!({"id": "R-0000701152025"})).as_deref(),
            Some("R-0000701152025")
        );
        assert_eq!(next_id_from_payload(&json!({"id": "R-7"})), None);
        assert_eq!(next_id_from_payload(&json!({"id": 7})), None);
        assert_eq!(next_id_from_payload(&json!(null)), None);
    }

    #[tokio::test]
    async fn unreachable_endpoints_are_errors() {
        let source = RestSource::new(
            "api",
            "API",
            vec!["http://127.0.0.1:9/api/reports".to_string()],
            default_client().unwrap(),
            RetryPolicy::none(),
        );

        assert!(source.fetch().await.is_err());
        assert!(source.next_id().await.is_none());
        assert!(source.submit(&Report::new("R-1")).await.is_err());
    }

    #[tokio::test]
    async fn no_endpoints_is_an_error() {
        let source = RestSource::new(
            "api",
            "API",
            vec![],
            default_client().unwrap(),
            RetryPolicy::none(),
        );
        assert!(source.fetch().await.is_err());
    }
}

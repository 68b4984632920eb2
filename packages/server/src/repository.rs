//! The JSON file the server keeps its reports in.
//!
//! Reports are stored as the raw objects clients sent. Every access goes
//! through one async mutex, so read-modify-write cycles never interleave.

use std::path::{Path, PathBuf};

use basurant_report_models::id::{format_report_id, parse_sequence};
use basurant_report_models::{Report, StatusAction};
use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::ServerError;

/// Identity of a raw report: `id`, else `reportId`, else `_id`.
#[must_use]
pub fn report_key(report: &Value) -> Option<String> {
    ["id", "reportId", "_id"].iter().find_map(|field| match report.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug)]
pub struct ReportFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReportFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or blank file is an empty list.
    async fn read_all(&self) -> Result<Vec<Value>, ServerError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn write_all(&self, reports: &[Value]) -> Result<(), ServerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            basurant_store::paths::ensure_dir(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(reports)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Every stored report, as sent.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the file is not a JSON array
    pub async fn list(&self) -> Result<Vec<Value>, ServerError> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    /// Stored reports that parse as [`Report`]; the rest are skipped.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the file is not a JSON array
    pub async fn reports(&self) -> Result<Vec<Report>, ServerError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect())
    }

    /// Appends one report.
    ///
    /// # Errors
    ///
    /// * If the report has no id
    /// * If the file cannot be read or written
    pub async fn append(&self, report: Value) -> Result<(), ServerError> {
        if report_key(&report).is_none() {
            return Err(ServerError::InvalidPayload);
        }
        let _guard = self.lock.lock().await;
        let mut reports = self.read_all().await?;
        reports.push(report);
        self.write_all(&reports).await
    }

    /// Merges `incoming` by id: a report with a known id replaces the stored
    /// one in place, new ids are appended in arrival order, and later
    /// entries win over earlier ones. Entries without an id are ignored.
    /// Returns the number of stored reports.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read or written
    pub async fn merge(&self, incoming: Vec<Value>) -> Result<usize, ServerError> {
        let _guard = self.lock.lock().await;
        let mut reports = self.read_all().await?;
        let mut keys: Vec<Option<String>> = reports.iter().map(report_key).collect();

        for report in incoming {
            let Some(key) = report_key(&report) else {
                log::debug!("Skipping bulk entry without id");
                continue;
            };
            match keys.iter().position(|k| k.as_deref() == Some(key.as_str())) {
                Some(index) => reports[index] = report,
                None => {
                    reports.push(report);
                    keys.push(Some(key));
                }
            }
        }

        self.write_all(&reports).await?;
        Ok(reports.len())
    }

    /// Applies an administrator action. Returns the raw status written.
    ///
    /// # Errors
    ///
    /// * If no report has this id
    /// * If the file cannot be read or written
    pub async fn set_status(&self, id: &str, action: StatusAction) -> Result<String, ServerError> {
        let _guard = self.lock.lock().await;
        let mut reports = self.read_all().await?;
        let report = reports
            .iter_mut()
            .find(|r| report_key(r).as_deref() == Some(id))
            .ok_or_else(|| ServerError::NotFound { id: id.to_string() })?;

        let status = action.raw_status().to_string();
        if let Value::Object(fields) = report {
            fields.insert("status".to_string(), Value::String(status.clone()));
        }
        self.write_all(&reports).await?;
        log::info!("Report {id}: {action} -> {status}");
        Ok(status)
    }

    /// Next id for a report submitted on `today`: one past the highest
    /// sequence in use.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    pub async fn next_id(&self, today: NaiveDate) -> Result<String, ServerError> {
        let highest = self
            .list()
            .await?
            .iter()
            .filter_map(report_key)
            .filter_map(|key| parse_sequence(&key))
            .max()
            .unwrap_or(0);
        Ok(format_report_id(highest + 1, today))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn temp_file(name: &str) -> ReportFile {
        let dir = std::env::temp_dir().join(format!("basurant_server_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        ReportFile::new(dir.join("reports.json"))
    }

    fn ids(values: &[Value]) -> Vec<String> {
        values.iter().filter_map(report_key).collect()
    }

    #[actix_web::test]
    async fn missing_file_is_empty() {
        let file = temp_file("missing");
        assert!(file.list().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn append_keeps_raw_fields() {
        let file = temp_file("append");
        file.append(json!({"id": "R-1", "photoUrl": "https://x/p.jpg", "extra": 7}))
            .await
            .unwrap();

        let stored = file.list().await.unwrap();
        assert_eq!(stored, [json!({"id": "R-1", "photoUrl": "https://x/p.jpg", "extra": 7})]);

        assert!(matches!(
            file.append(json!({"type": "Plastic"})).await,
            Err(ServerError::InvalidPayload)
        ));
        assert_eq!(file.list().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn bulk_merge_replaces_by_id_in_insertion_order() {
        let file = temp_file("merge");
        file.append(json!({"id": "R-1", "status": "pending"}))
            .await
            .unwrap();

        let count = file
            .merge(vec![
                json!({"id": "R-1", "status": "cleaned"}),
                json!({"id": "R-2", "status": "pending"}),
                json!({"status": "orphan"}),
            ])
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            file.list().await.unwrap(),
            [
                json!({"id": "R-1", "status": "cleaned"}),
                json!({"id": "R-2", "status": "pending"}),
            ]
        );
    }

    #[actix_web::test]
    async fn later_duplicates_win_within_one_batch() {
        let file = temp_file("dupes");
        file.merge(vec![
            json!({"id": "R-1", "status": "pending"}),
            json!({"reportId": "R-1", "status": "assigned"}),
        ])
        .await
        .unwrap();

        let stored = file.list().await.unwrap();
        assert_eq!(ids(&stored), ["R-1"]);
        assert_eq!(stored[0]["status"], "assigned");
    }

    #[actix_web::test]
    async fn status_actions_update_the_stored_report() {
        let file = temp_file("status");
        file.append(json!({"id": "R-1", "status": "pending"}))
            .await
            .unwrap();

        assert_eq!(
            file.set_status("R-1", StatusAction::Assign).await.unwrap(),
            "in_progress"
        );
        assert_eq!(file.list().await.unwrap()[0]["status"], "in_progress");

        assert!(matches!(
            file.set_status("R-9", StatusAction::Clean).await,
            Err(ServerError::NotFound { .. })
        ));
    }

    #[actix_web::test]
    async fn next_id_follows_highest_sequence() {
        let file = temp_file("next_id");
        let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(file.next_id(today).await.unwrap(), "R-0000103072025");

        file.merge(vec![
            json!({"id": "R-0004101012025"}),
            json!({"id": "R-0000902022025"}),
            json!({"id": "legacy-7"}),
        ])
        .await
        .unwrap();
        assert_eq!(file.next_id(today).await.unwrap(), "R-0004203072025");
    }

    #[actix_web::test]
    async fn reports_skip_unparseable_entries() {
        let file = temp_file("parsed");
        file.merge(vec![json!({"id": "R-1", "size": "large"}), json!({"_id": 5})])
            .await
            .unwrap();
        std::fs::write(
            file.path(),
            r#"[{"id": "R-1"}, {"type": "no id"}, {"_id": 5}]"#,
        )
        .unwrap();

        let ids: Vec<String> = file.reports().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["R-1", "5"]);
    }
}

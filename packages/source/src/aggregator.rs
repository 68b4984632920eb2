//! Walks the source chain.
//!
//! Every failure means "try the next source"; running out of sources yields
//! an empty list, never an error.

use std::sync::Arc;

use basurant_report_models::{CanonicalStatus, Report, canonical_status};
use basurant_store::ReportStore;

use crate::retry::RetryPolicy;
use crate::source_def::SourceDefinition;
use crate::{ReportSource, SourceKind};

/// An ordered chain of report sources.
#[derive(Clone, Default)]
pub struct ReportAggregator {
    sources: Vec<Arc<dyn ReportSource>>,
}

impl std::fmt::Debug for ReportAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|s| s.id()))
            .finish()
    }
}

impl ReportAggregator {
    /// Creates an aggregator over sources already in chain order.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn ReportSource>>) -> Self {
        Self { sources }
    }

    /// Builds the chain from (already filtered and ordered) definitions.
    #[must_use]
    pub fn from_definitions(
        defs: &[SourceDefinition],
        store: &Arc<ReportStore>,
        client: &reqwest::Client,
        retry: RetryPolicy,
    ) -> Self {
        Self::new(
            defs.iter()
                .filter(|d| d.enabled)
                .map(|d| d.build(store, client, retry))
                .collect(),
        )
    }

    #[must_use]
    pub fn sources(&self) -> &[Arc<dyn ReportSource>] {
        &self.sources
    }

    /// Returns the first non-empty list in chain order.
    pub async fn fetch_all(&self) -> Vec<Report> {
        first_non_empty(self.sources.iter()).await
    }

    /// Returns the first non-empty remote list followed by every local
    /// list, without de-duplication.
    pub async fn fetch_combined(&self) -> Vec<Report> {
        let mut combined =
            first_non_empty(self.sources.iter().filter(|s| s.kind().is_remote())).await;

        for source in self.sources.iter().filter(|s| !s.kind().is_remote()) {
            match source.fetch().await {
                Ok(reports) => combined.extend(reports),
                Err(e) => log::debug!("Source '{}' failed: {e}", source.id()),
            }
        }

        combined
    }

    /// Maps a raw status to its canonical form.
    #[must_use]
    pub fn normalize_status(raw: &str) -> CanonicalStatus {
        canonical_status(raw)
    }

    /// Finds a report by id: first in `cached`, then in the realtime
    /// database, then through the REST API. A miss is logged and `None`.
    pub async fn find_by_id(&self, cached: &[Report], id: &str) -> Option<Report> {
        if let Some(report) = cached.iter().find(|r| r.id == id) {
            return Some(report.clone());
        }

        for kind in [SourceKind::RealtimeDb, SourceKind::Rest] {
            for source in self.sources.iter().filter(|s| s.kind() == kind) {
                match source.fetch().await {
                    Ok(reports) => {
                        if let Some(report) = reports.into_iter().find(|r| r.id == id) {
                            return Some(report);
                        }
                    }
                    Err(e) => log::debug!("Lookup of {id} in '{}' failed: {e}", source.id()),
                }
            }
        }

        log::debug!("Report {id} not found");
        None
    }
}

async fn first_non_empty<'a>(sources: impl Iterator<Item = &'a Arc<dyn ReportSource>>) -> Vec<Report> {
    for source in sources {
        match source.fetch().await {
            Ok(reports) if !reports.is_empty() => {
                log::info!("Loaded {} reports from '{}'", reports.len(), source.name());
                return reports;
            }
            Ok(_) => log::debug!("Source '{}' returned no reports", source.id()),
            Err(e) => log::debug!("Source '{}' failed: {e}", source.id()),
        }
    }
    log::debug!("All sources exhausted");
    Vec::new()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::SourceError;

    /// Scripted source: each call returns the next scripted answer (the
    /// last one repeats), optionally after a delay.
    pub struct StubSource {
        pub id: &'static str,
        pub kind: SourceKind,
        pub answers: Vec<Option<Vec<Report>>>,
        pub delays: Vec<Duration>,
        pub calls: AtomicUsize,
    }

    impl StubSource {
        pub fn new(id: &'static str, kind: SourceKind, answers: Vec<Option<Vec<Report>>>) -> Self {
            Self {
                id,
                kind,
                answers,
                delays: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn ok(id: &'static str, kind: SourceKind, ids: &[&str]) -> Arc<dyn ReportSource> {
            Arc::new(Self::new(
                id,
                kind,
                vec![Some(ids.iter().map(|i| Report::new(*i)).collect())],
            ))
        }

        pub fn failing(id: &'static str, kind: SourceKind) -> Arc<dyn ReportSource> {
            Arc::new(Self::new(id, kind, vec![None]))
        }
    }

    #[async_trait]
    impl ReportSource for StubSource {
        fn id(&self) -> &str {
            self.id
        }

        fn name(&self) -> &str {
            self.id
        }

        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn fetch(&self) -> Result<Vec<Report>, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(call).or(self.delays.last()) {
                tokio::time::sleep(*delay).await;
            }
            self.answers
                .get(call)
                .or(self.answers.last())
                .cloned()
                .flatten()
                .ok_or_else(|| SourceError::Response {
                    message: "stub failure".to_string(),
                })
        }
    }

    fn ids(reports: &[Report]) -> Vec<&str> {
        reports.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn first_non_empty_source_wins() {
        let aggregator = ReportAggregator::new(vec![
            StubSource::failing("rest", SourceKind::Rest),
            StubSource::ok("db", SourceKind::RealtimeDb, &[]),
            StubSource::ok("local", SourceKind::LocalStore, &["R-local"]),
        ]);
        assert_eq!(ids(&aggregator.fetch_all().await), ["R-local"]);
    }

    #[tokio::test]
    async fn earlier_sources_short_circuit() {
        let aggregator = ReportAggregator::new(vec![
            StubSource::ok("rest", SourceKind::Rest, &["R-1", "R-2"]),
            StubSource::ok("local", SourceKind::LocalStore, &["R-local"]),
        ]);
        assert_eq!(ids(&aggregator.fetch_all().await), ["R-1", "R-2"]);
    }

    #[tokio::test]
    async fn exhausted_chain_is_empty() {
        let aggregator = ReportAggregator::new(vec![
            StubSource::failing("rest", SourceKind::Rest),
            StubSource::failing("db", SourceKind::RealtimeDb),
        ]);
        assert!(aggregator.fetch_all().await.is_empty());
        assert!(ReportAggregator::default().fetch_all().await.is_empty());
    }

    #[tokio::test]
    async fn combined_concatenates_remote_and_local() {
        let aggregator = ReportAggregator::new(vec![
            StubSource::ok("rest", SourceKind::Rest, &["R-1"]),
            StubSource::ok("db", SourceKind::RealtimeDb, &["R-db"]),
            StubSource::ok("local", SourceKind::LocalStore, &["R-1", "R-9"]),
        ]);
        assert_eq!(ids(&aggregator.fetch_combined().await), ["R-1", "R-1", "R-9"]);
    }

    #[tokio::test]
    async fn find_by_id_prefers_memory_then_database_then_rest() {
        let db = Arc::new(StubSource::new(
            "db",
            SourceKind::RealtimeDb,
            vec![Some(vec![Report::new("R-db")])],
        ));
        let db_source: Arc<dyn ReportSource> = db.clone();
        let aggregator = ReportAggregator::new(vec![
            StubSource::ok("rest", SourceKind::Rest, &["R-db", "R-rest"]),
            db_source,
        ]);

        let mut cached = Report::new("R-db");
        cached.status = "cleaned".to_string();
        let found = aggregator
            .find_by_id(std::slice::from_ref(&cached), "R-db")
            .await
            .unwrap();
        assert_eq!(found.status, "cleaned");
        assert_eq!(db.calls.load(Ordering::SeqCst), 0);

        let found = aggregator.find_by_id(&[], "R-db").await.unwrap();
        assert_eq!(found.id, "R-db");
        assert_eq!(db.calls.load(Ordering::SeqCst), 1);

        let found = aggregator.find_by_id(&[], "R-rest").await.unwrap();
        assert_eq!(found.id, "R-rest");

        assert!(aggregator.find_by_id(&[], "R-missing").await.is_none());
    }

    #[test]
    fn normalize_status_delegates_to_status_table() {
        assert_eq!(
            ReportAggregator::normalize_status("Resolved"),
            CanonicalStatus::Cleaned
        );
        assert_eq!(
            ReportAggregator::normalize_status("verified"),
            CanonicalStatus::Pending
        );
    }
}

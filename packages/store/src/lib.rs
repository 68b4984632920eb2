#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tiered local persistence for reports.
//!
//! A [`ReportStore`] holds an ordered list of [`StorageTier`]s. Writes go to
//! the first tier that accepts them; a tier flagged `trim_on_capacity` is
//! retried with progressively smaller payloads (no video, then no video and
//! no embedded images) before the store moves on. A list saved to a later
//! tier evicts the lists held by earlier ones, so reads, which return the
//! first tier holding a readable list, always see the newest save.
//!
//! The store never surfaces errors to callers: a failed save is `false`, an
//! unreadable list is empty.

pub mod backend;
pub mod paths;

use std::sync::Arc;

use async_trait::async_trait;
use basurant_report_models::Report;
use serde_json::Value;

pub use backend::{FileBackend, MemoryBackend};

/// Key holding the current report list.
pub const REPORTS_KEY: &str = "basurant_reports_v1";

/// Key written by the first-generation submission form.
pub const LEGACY_REPORTS_KEY: &str = "basurant_reports";

/// Key holding the local id counter.
pub const COUNTER_KEY: &str = "basurant_report_counter";

/// Default quota for the primary tier, matching a typical browser origin.
pub const DEFAULT_PRIMARY_QUOTA: u64 = 5 * 1024 * 1024;

/// Errors that can occur in a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The write would exceed the tier's quota.
    #[error("Tier '{tier}' is full: {needed} bytes needed, quota is {quota}")]
    Capacity {
        /// Tier name.
        tier: String,
        /// Bytes the tier would hold after the write.
        needed: u64,
        /// Configured quota.
        quota: u64,
    },

    /// The backend cannot be used at all.
    #[error("Tier '{tier}' unavailable: {message}")]
    Unavailable {
        /// Tier name.
        tier: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// A string key-value backend.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Returns a short name used in logs.
    fn name(&self) -> &str;

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Capacity`] if the value does not fit, or
    /// another [`StoreError`] if the backend cannot be written.
    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One entry in the store's fallback order.
#[derive(Clone)]
pub struct StorageTier {
    pub backend: Arc<dyn StorageBackend>,
    /// Retry with smaller payloads when the backend reports it is full.
    pub trim_on_capacity: bool,
}

impl std::fmt::Debug for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageTier")
            .field("backend", &self.backend.name())
            .field("trim_on_capacity", &self.trim_on_capacity)
            .finish()
    }
}

impl StorageTier {
    #[must_use]
    pub fn new(backend: impl StorageBackend + 'static, trim_on_capacity: bool) -> Self {
        Self {
            backend: Arc::new(backend),
            trim_on_capacity,
        }
    }
}

/// Payload reductions tried, in order, on a trimming tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trim {
    None,
    Video,
    VideoAndImages,
}

impl Trim {
    const ALL: [Self; 3] = [Self::None, Self::Video, Self::VideoAndImages];

    fn apply(self, list: &[Report]) -> Vec<Report> {
        list.iter()
            .cloned()
            .map(|mut r| {
                if self != Self::None {
                    r.strip_video();
                }
                if self == Self::VideoAndImages {
                    r.strip_embedded_images();
                }
                r
            })
            .collect()
    }
}

/// Reads and writes the local report list across ordered tiers.
#[derive(Debug, Clone)]
pub struct ReportStore {
    tiers: Vec<StorageTier>,
}

impl ReportStore {
    #[must_use]
    pub const fn new(tiers: Vec<StorageTier>) -> Self {
        Self { tiers }
    }

    /// File-backed store under [`paths::data_dir`]: a quota-limited,
    /// trimming primary tier and an unlimited secondary tier.
    #[must_use]
    pub fn open_default() -> Self {
        Self::new(vec![
            StorageTier::new(
                FileBackend::new(
                    "local",
                    paths::local_store_dir(),
                    Some(DEFAULT_PRIMARY_QUOTA),
                ),
                true,
            ),
            StorageTier::new(
                FileBackend::new("fallback", paths::fallback_store_dir(), None),
                false,
            ),
        ])
    }

    /// Returns the persisted report list.
    ///
    /// Tiers are read in order; within a tier the current key is preferred
    /// over the legacy one. Entries that fail to parse are dropped, and a
    /// list that is not a JSON array counts as no data.
    pub async fn load(&self) -> Vec<Report> {
        for tier in &self.tiers {
            for key in [REPORTS_KEY, LEGACY_REPORTS_KEY] {
                match tier.backend.read(key).await {
                    Ok(Some(text)) => {
                        if let Some(list) = parse_report_list(&text) {
                            log::debug!(
                                "Loaded {} reports from '{}' ({key})",
                                list.len(),
                                tier.backend.name()
                            );
                            return list;
                        }
                        log::warn!(
                            "Ignoring corrupted report list in '{}' ({key})",
                            tier.backend.name()
                        );
                    }
                    Ok(None) => {}
                    Err(e) => {
                        log::warn!("Failed to read '{}' ({key}): {e}", tier.backend.name());
                        break;
                    }
                }
            }
        }
        Vec::new()
    }

    /// Persists the full report list. Returns `false` only when every tier
    /// refused it.
    pub async fn save(&self, list: &[Report]) -> bool {
        for (index, tier) in self.tiers.iter().enumerate() {
            let trims: &[Trim] = if tier.trim_on_capacity {
                &Trim::ALL
            } else {
                &Trim::ALL[..1]
            };

            for &trim in trims {
                let payload = match serde_json::to_string(&trim.apply(list)) {
                    Ok(payload) => payload,
                    Err(e) => {
                        log::error!("Failed to serialize report list: {e}");
                        return false;
                    }
                };

                match tier.backend.write(REPORTS_KEY, &payload).await {
                    Ok(()) => {
                        if trim != Trim::None {
                            log::warn!(
                                "Saved {} reports to '{}' with {trim:?} trimmed",
                                list.len(),
                                tier.backend.name()
                            );
                        }
                        self.evict_lists_before(index).await;
                        return true;
                    }
                    Err(e @ StoreError::Capacity { .. }) => {
                        log::warn!("{e}");
                    }
                    Err(e) => {
                        log::warn!("Failed to write '{}': {e}", tier.backend.name());
                        break;
                    }
                }
            }
        }

        log::error!("Failed to save {} reports to any tier", list.len());
        false
    }

    /// Drops the report lists of the tiers ahead of `index` so they cannot
    /// shadow the list just written there.
    async fn evict_lists_before(&self, index: usize) {
        for tier in &self.tiers[..index] {
            for key in [REPORTS_KEY, LEGACY_REPORTS_KEY] {
                if let Err(e) = tier.backend.remove(key).await {
                    log::warn!(
                        "Failed to evict stale list from '{}' ({key}): {e}",
                        tier.backend.name()
                    );
                }
            }
        }
    }

    /// Writes an arbitrary value to the secondary tiers. Failures are
    /// swallowed.
    pub async fn save_fallback(&self, key: &str, value: &Value) -> bool {
        let Ok(payload) = serde_json::to_string(value) else {
            return false;
        };
        for tier in self.tiers.iter().skip(1) {
            match tier.backend.write(key, &payload).await {
                Ok(()) => return true,
                Err(e) => log::debug!("Fallback write to '{}' failed: {e}", tier.backend.name()),
            }
        }
        false
    }

    /// Reads a value from the secondary tiers.
    pub async fn get_fallback(&self, key: &str) -> Option<Value> {
        for tier in self.tiers.iter().skip(1) {
            match tier.backend.read(key).await {
                Ok(Some(text)) => match serde_json::from_str(&text) {
                    Ok(value) => return Some(value),
                    Err(e) => log::debug!("Fallback value '{key}' is corrupted: {e}"),
                },
                Ok(None) => {}
                Err(e) => log::debug!("Fallback read from '{}' failed: {e}", tier.backend.name()),
            }
        }
        None
    }

    /// Increments and returns the local id counter.
    ///
    /// The counter continues from the highest value held by any tier and is
    /// written to the first tier that accepts it, so a full primary tier
    /// never restarts the sequence. When no tier can hold the counter,
    /// derives a sequence from the clock instead.
    pub async fn next_local_sequence(&self) -> u32 {
        let mut current = 0u32;
        for tier in &self.tiers {
            match tier.backend.read(COUNTER_KEY).await {
                Ok(value) => {
                    let stored = value
                        .and_then(|v| v.trim().parse::<u32>().ok())
                        .unwrap_or(0);
                    current = current.max(stored);
                }
                Err(e) => log::debug!("Counter read from '{}' failed: {e}", tier.backend.name()),
            }
        }

        let next = current.saturating_add(1);
        for tier in &self.tiers {
            match tier.backend.write(COUNTER_KEY, &next.to_string()).await {
                Ok(()) => return next,
                Err(e) => log::debug!("Counter write to '{}' failed: {e}", tier.backend.name()),
            }
        }

        log::warn!("No tier accepts the id counter, using the clock");
        let millis = chrono::Utc::now().timestamp_millis().rem_euclid(100_000);
        u32::try_from(millis).ok().filter(|&n| n != 0).unwrap_or(1)
    }
}

/// Parses a stored list, dropping unreadable entries. Returns `None` when
/// the text is not a JSON array.
fn parse_report_list(text: &str) -> Option<Vec<Report>> {
    let entries: Vec<Value> = serde_json::from_str(text).ok()?;
    Some(
        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Report>(entry) {
                Ok(report) => Some(report),
                Err(e) => {
                    log::debug!("Dropping unreadable stored report: {e}");
                    None
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use basurant_report_models::MediaRef;

    use super::*;

    /// Backend whose every call fails.
    struct BrokenBackend;

    #[async_trait]
    impl StorageBackend for BrokenBackend {
        fn name(&self) -> &str {
            "broken"
        }

        async fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable {
                tier: "broken".to_string(),
                message: "disabled".to_string(),
            })
        }

        async fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable {
                tier: "broken".to_string(),
                message: "disabled".to_string(),
            })
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable {
                tier: "broken".to_string(),
                message: "disabled".to_string(),
            })
        }
    }

    fn report_with_media(id: &str) -> Report {
        let mut report = Report::new(id);
        report.photo = Some(MediaRef::Embedded(format!("data:image/png;base64,{}", "A".repeat(400))));
        report.video = Some(MediaRef::Embedded(format!("data:video/mp4;base64,{}", "B".repeat(800))));
        report
    }

    fn memory_store(quota: Option<u64>) -> (ReportStore, Arc<MemoryBackend>, Arc<MemoryBackend>) {
        let primary = Arc::new(MemoryBackend::new("primary", quota));
        let secondary = Arc::new(MemoryBackend::new("secondary", None));
        let store = ReportStore::new(vec![
            StorageTier {
                backend: primary.clone(),
                trim_on_capacity: true,
            },
            StorageTier {
                backend: secondary.clone(),
                trim_on_capacity: false,
            },
        ]);
        (store, primary, secondary)
    }

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let (store, _, _) = memory_store(None);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (store, _, _) = memory_store(None);
        let mut a = Report::new("R-0000101012025");
        a.lat = Some(16.41);
        a.lng = Some(120.6);
        let list = vec![a, Report::new("R-0000201012025")];

        assert!(store.save(&list).await);
        assert_eq!(store.load().await, list);
    }

    #[tokio::test]
    async fn corrupted_primary_counts_as_no_data() {
        let (store, primary, secondary) = memory_store(None);
        primary.write(REPORTS_KEY, "{not json").await.unwrap();
        assert!(store.load().await.is_empty());

        secondary
            .write(REPORTS_KEY, r#"[{"id":"R-1"}]"#)
            .await
            .unwrap();
        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "R-1");
    }

    #[tokio::test]
    async fn unreadable_entries_are_dropped() {
        let (store, primary, _) = memory_store(None);
        primary
            .write(REPORTS_KEY, r#"[{"id":"R-1"}, {"type":"no id"}, 7, {"id":"R-2"}]"#)
            .await
            .unwrap();
        let ids: Vec<String> = store.load().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["R-1", "R-2"]);
    }

    #[tokio::test]
    async fn legacy_key_is_read_when_current_is_absent() {
        let (store, primary, _) = memory_store(None);
        primary
            .write(LEGACY_REPORTS_KEY, r#"[{"id":"R-legacy","createdAt":"2024-01-05T10:00:00Z"}]"#)
            .await
            .unwrap();
        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].created_at.is_some());
    }

    #[tokio::test]
    async fn full_primary_strips_video_first() {
        let list = vec![report_with_media("R-1")];
        let full = serde_json::to_string(&list).unwrap().len() as u64;
        let (store, primary, secondary) = memory_store(Some(full - 1));

        assert!(store.save(&list).await);

        let stored = primary.read(REPORTS_KEY).await.unwrap().unwrap();
        let loaded = parse_report_list(&stored).unwrap();
        assert!(loaded[0].video.is_none());
        assert!(loaded[0].photo.is_some());
        assert_eq!(secondary.read(REPORTS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn full_primary_strips_images_second() {
        let list = vec![report_with_media("R-1")];
        let (store, primary, _) = memory_store(Some(200));

        assert!(store.save(&list).await);

        let stored = primary.read(REPORTS_KEY).await.unwrap().unwrap();
        let loaded = parse_report_list(&stored).unwrap();
        assert!(loaded[0].video.is_none());
        assert!(loaded[0].photo.is_none());
    }

    #[tokio::test]
    async fn tiny_primary_falls_through_to_secondary_untrimmed() {
        let list = vec![report_with_media("R-1")];
        let (store, primary, secondary) = memory_store(Some(5));

        assert!(store.save(&list).await);
        assert_eq!(primary.read(REPORTS_KEY).await.unwrap(), None);

        let stored = secondary.read(REPORTS_KEY).await.unwrap().unwrap();
        assert_eq!(parse_report_list(&stored).unwrap(), list);
        assert_eq!(store.load().await, list);
    }

    #[tokio::test]
    async fn all_tiers_failing_returns_false() {
        let store = ReportStore::new(vec![StorageTier::new(BrokenBackend, true)]);
        assert!(!store.save(&[Report::new("R-1")]).await);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn fallback_values_skip_primary() {
        let (store, primary, _) = memory_store(None);
        let value = serde_json::json!([{"id": "R-9"}]);

        assert!(store.save_fallback(REPORTS_KEY, &value).await);
        assert_eq!(store.get_fallback(REPORTS_KEY).await, Some(value));
        assert_eq!(primary.read(REPORTS_KEY).await.unwrap(), None);
        assert_eq!(store.get_fallback("missing").await, None);
    }

    #[tokio::test]
    async fn fallback_without_secondary_tier_is_swallowed() {
        let store = ReportStore::new(vec![StorageTier::new(MemoryBackend::new("only", None), true)]);
        assert!(!store.save_fallback("k", &serde_json::json!(1)).await);
        assert_eq!(store.get_fallback("k").await, None);
    }

    #[tokio::test]
    async fn counter_increments() {
        let (store, _, _) = memory_store(None);
        assert_eq!(store.next_local_sequence().await, 1);
        assert_eq!(store.next_local_sequence().await, 2);
    }

    #[tokio::test]
    async fn newer_list_in_secondary_is_not_shadowed_by_primary() {
        let (store, primary, secondary) = memory_store(Some(60));
        let first = vec![Report::new("R-1")];
        assert!(store.save(&first).await);
        assert!(primary.read(REPORTS_KEY).await.unwrap().is_some());

        let mut second = Report::new("R-2");
        second.photo = Some(MediaRef::Url("https://example.com/dump.jpg".to_string()));
        let both = vec![Report::new("R-1"), second];
        assert!(store.save(&both).await);

        assert_eq!(primary.read(REPORTS_KEY).await.unwrap(), None);
        assert!(secondary.read(REPORTS_KEY).await.unwrap().is_some());
        assert_eq!(store.load().await, both);

        let mut list = store.load().await;
        list.push(Report::new("R-3"));
        assert!(store.save(&list).await);
        let ids: Vec<String> = store.load().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["R-1", "R-2", "R-3"]);
    }

    #[tokio::test]
    async fn counter_keeps_counting_when_primary_fills_up() {
        let (store, primary, secondary) = memory_store(Some(100));
        let mut seen = Vec::new();
        for _ in 0..9 {
            seen.push(store.next_local_sequence().await);
        }
        assert_eq!(seen, [1, 2, 3, 4, 5, 6, 7, 8, 9]);

        primary.write("filler", &"x".repeat(99)).await.unwrap();
        for _ in 0..3 {
            let next = store.next_local_sequence().await;
            assert!(!seen.contains(&next), "sequence {next} handed out twice");
            seen.push(next);
        }
        assert_eq!(&seen[9..], [10, 11, 12]);
        assert_eq!(secondary.read(COUNTER_KEY).await.unwrap().as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn counter_without_storage_uses_clock() {
        let store = ReportStore::new(vec![StorageTier::new(BrokenBackend, true)]);
        let seq = store.next_local_sequence().await;
        assert!((1..100_000).contains(&seq));
    }
}

//! Latest-wins report feed.
//!
//! Views refresh the report list in response to user actions, so several
//! fetches can be in flight at once and finish out of order. Each refresh
//! takes a generation number when it starts; only the newest generation is
//! allowed to publish, so a slow, superseded fetch can never overwrite a
//! newer list.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use basurant_report_models::Report;
use tokio::sync::watch;

use crate::ReportAggregator;

/// A published report list.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// Generation of the refresh that produced this list; `0` before the
    /// first publish.
    pub generation: u64,
    pub reports: Arc<Vec<Report>>,
}

#[derive(Debug)]
pub struct ReportFeed {
    aggregator: Arc<ReportAggregator>,
    generation: AtomicU64,
    tx: watch::Sender<FeedSnapshot>,
}

impl ReportFeed {
    #[must_use]
    pub fn new(aggregator: Arc<ReportAggregator>) -> Self {
        let (tx, _) = watch::channel(FeedSnapshot::default());
        Self {
            aggregator,
            generation: AtomicU64::new(0),
            tx,
        }
    }

    /// Receives every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.tx.subscribe()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> FeedSnapshot {
        self.tx.borrow().clone()
    }

    /// Starts a new generation, superseding any refresh still in flight.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publishes `reports` if `generation` is still the newest one started.
    /// Returns whether the list was published.
    pub fn publish(&self, generation: u64, reports: Vec<Report>) -> bool {
        if generation != self.generation.load(Ordering::SeqCst) {
            log::debug!("Discarding superseded refresh {generation}");
            return false;
        }
        self.tx.send_if_modified(|current| {
            if generation <= current.generation {
                return false;
            }
            *current = FeedSnapshot {
                generation,
                reports: Arc::new(reports),
            };
            true
        })
    }

    /// Fetches through the aggregator and publishes the result unless a
    /// newer refresh started meanwhile.
    pub async fn refresh(&self) -> bool {
        let generation = self.begin();
        let reports = self.aggregator.fetch_all().await;
        self.publish(generation, reports)
    }
}

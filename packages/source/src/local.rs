//! The local store as a link in the source chain.

use std::sync::Arc;

use async_trait::async_trait;
use basurant_report_models::Report;
use basurant_store::ReportStore;

use crate::{ReportSource, SourceError, SourceKind};

#[derive(Debug, Clone)]
pub struct LocalSource {
    id: String,
    name: String,
    store: Arc<ReportStore>,
}

impl LocalSource {
    #[must_use]
    pub fn new(id: &str, name: &str, store: Arc<ReportStore>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            store,
        }
    }
}

#[async_trait]
impl ReportSource for LocalSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::LocalStore
    }

    /// Never fails; an unreadable store is empty.
    async fn fetch(&self) -> Result<Vec<Report>, SourceError> {
        Ok(self.store.load().await)
    }
}

//! Config-driven source definition.
//!
//! [`SourceDefinition`] captures everything about one link of the source
//! chain in a serializable config struct; [`SourceDefinition::build`] turns
//! it into a live [`ReportSource`].

use std::sync::Arc;

use basurant_store::ReportStore;
use serde::Deserialize;

use crate::local::LocalSource;
use crate::realtime_db::RealtimeDbSource;
use crate::rest::RestSource;
use crate::retry::RetryPolicy;
use crate::{ReportSource, SourceError, SourceKind};

/// One link of the source chain.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"rest_api"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Disabled sources are skipped entirely.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower runs first.
    #[serde(default)]
    pub priority: u32,
    pub provider: ProviderConfig,
}

const fn default_enabled() -> bool {
    true
}

fn default_db_path() -> String {
    "reports".to_string()
}

/// How to reach the source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// JSON report API answering `GET` with `{ "reports": [...] }`.
    Rest {
        /// Collection URLs, tried in order.
        endpoints: Vec<String>,
    },
    /// Realtime database read through `{database_url}/{path}.json`.
    RealtimeDb {
        database_url: String,
        /// Node holding the id → report map.
        #[serde(default = "default_db_path")]
        path: String,
    },
    /// The local report store.
    LocalStore,
}

impl ProviderConfig {
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Rest { .. } => SourceKind::Rest,
            Self::RealtimeDb { .. } => SourceKind::RealtimeDb,
            Self::LocalStore => SourceKind::LocalStore,
        }
    }
}

impl SourceDefinition {
    /// Instantiates the source.
    #[must_use]
    pub fn build(
        &self,
        store: &Arc<ReportStore>,
        client: &reqwest::Client,
        retry: RetryPolicy,
    ) -> Arc<dyn ReportSource> {
        match &self.provider {
            ProviderConfig::Rest { endpoints } => Arc::new(RestSource::new(
                &self.id,
                &self.name,
                endpoints.clone(),
                client.clone(),
                retry,
            )),
            ProviderConfig::RealtimeDb { database_url, path } => Arc::new(RealtimeDbSource::new(
                &self.id,
                &self.name,
                database_url,
                path,
                client.clone(),
                retry,
            )),
            ProviderConfig::LocalStore => {
                Arc::new(LocalSource::new(&self.id, &self.name, Arc::clone(store)))
            }
        }
    }
}

/// Parses a single source definition.
///
/// # Errors
///
/// Returns [`SourceError::Toml`] if the text is not a valid definition.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, SourceError> {
    Ok(toml::de::from_str(toml_str)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rest_definition() {
        let def = parse_source_toml(
            r#"
            id = "api"
            name = "API"
            priority = 5

            [provider]
            type = "rest"
            endpoints = ["http://a/api/reports", "http://b/api/reports"]
            "#,
        )
        .unwrap();

        assert!(def.enabled);
        assert_eq!(def.priority, 5);
        assert_eq!(def.provider.kind(), SourceKind::Rest);
        assert_eq!(
            def.provider,
            ProviderConfig::Rest {
                endpoints: vec![
                    "http://a/api/reports".to_string(),
                    "http://b/api/reports".to_string()
                ]
            }
        );
    }

    #[test]
    fn realtime_db_path_defaults_to_reports() {
        let def = parse_source_toml(
            r#"
            id = "db"
            name = "DB"
            enabled = false

            [provider]
            type = "realtime_db"
            database_url = "https://example.firebaseio.com"
            "#,
        )
        .unwrap();

        assert!(!def.enabled);
        assert_eq!(
            def.provider,
            ProviderConfig::RealtimeDb {
                database_url: "https://example.firebaseio.com".to_string(),
                path: "reports".to_string(),
            }
        );
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let result = parse_source_toml(
            r#"
            id = "x"
            name = "X"

            [provider]
            type = "ftp"
            "#,
        );
        assert!(result.is_err());
    }
}

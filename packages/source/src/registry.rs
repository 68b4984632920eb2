//! Source registry: loads the source chain from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! at compile time via [`include_str!`]. A deployment can replace the whole
//! chain by pointing `BASURANT_SOURCES` at a file of `[[sources]]` tables.

use std::path::Path;

use serde::Deserialize;

use crate::SourceError;
use crate::source_def::{ProviderConfig, SourceDefinition, parse_source_toml};

/// Environment variable naming an override chain file.
pub const SOURCES_ENV: &str = "BASURANT_SOURCES";

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("rest_api", include_str!("../sources/rest_api.toml")),
    ("realtime_db", include_str!("../sources/realtime_db.toml")),
    ("local_store", include_str!("../sources/local_store.toml")),
];

/// Total number of configured sources (used in tests).
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 3;

/// Returns all built-in source definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Filters out disabled sources and orders the rest by priority. Sources
/// sharing a priority keep their listed order.
#[must_use]
pub fn enabled_sources(mut defs: Vec<SourceDefinition>) -> Vec<SourceDefinition> {
    defs.retain(|d| d.enabled);
    defs.sort_by_key(|d| d.priority);
    defs
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    sources: Vec<SourceDefinition>,
}

/// Parses a chain file of `[[sources]]` tables.
///
/// # Errors
///
/// Returns [`SourceError::Toml`] if the text is malformed.
pub fn parse_sources_file(text: &str) -> Result<Vec<SourceDefinition>, SourceError> {
    Ok(toml::de::from_str::<SourcesFile>(text)?.sources)
}

/// Reads a chain file from disk.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or parsed.
pub fn load_sources_file(path: &Path) -> Result<Vec<SourceDefinition>, SourceError> {
    let text = std::fs::read_to_string(path)?;
    parse_sources_file(&text)
}

/// Returns the active chain: the override file named by
/// [`SOURCES_ENV`] if set, the built-in definitions otherwise.
///
/// # Errors
///
/// Returns [`SourceError`] if the override file cannot be read or parsed.
pub fn load_sources() -> Result<Vec<SourceDefinition>, SourceError> {
    let defs = match std::env::var_os(SOURCES_ENV).filter(|v| !v.is_empty()) {
        Some(path) => {
            log::info!("Loading source chain from {}", Path::new(&path).display());
            load_sources_file(Path::new(&path))?
        }
        None => all_sources(),
    };
    Ok(enabled_sources(defs))
}

/// Every REST collection URL in the chain, in chain order.
#[must_use]
pub fn rest_endpoints(defs: &[SourceDefinition]) -> Vec<String> {
    defs.iter()
        .filter(|d| d.enabled)
        .filter_map(|d| match &d.provider {
            ProviderConfig::Rest { endpoints } => Some(endpoints.iter().cloned()),
            _ => None,
        })
        .flatten()
        .collect()
}

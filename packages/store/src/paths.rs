#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for locally persisted report data.
//!
//! Everything lives under one data directory, taken from
//! `BASURANT_DATA_DIR` or defaulting to `data/` in the working directory.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "BASURANT_DATA_DIR";

/// Returns the data directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from("data"), PathBuf::from)
}

/// Returns the directory backing the primary (quota-limited) tier.
#[must_use]
pub fn local_store_dir() -> PathBuf {
    data_dir().join("local")
}

/// Returns the directory backing the secondary tier.
#[must_use]
pub fn fallback_store_dir() -> PathBuf {
    data_dir().join("fallback")
}

/// Returns the JSON file the REST server keeps its reports in.
#[must_use]
pub fn reports_json_path() -> PathBuf {
    data_dir().join("reports.json")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !tokio::fs::try_exists(path).await? {
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

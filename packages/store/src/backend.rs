//! Storage backends usable as store tiers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{StorageBackend, StoreError};

/// Stores each key as `<dir>/<key>.json`.
///
/// An optional byte quota caps the total size of all keys, mimicking a
/// browser's per-origin storage limit.
#[derive(Debug, Clone)]
pub struct FileBackend {
    name: String,
    dir: PathBuf,
    quota: Option<u64>,
}

impl FileBackend {
    #[must_use]
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, quota: Option<u64>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            quota,
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    /// Bytes used by every key except `excluded`.
    async fn used_bytes(&self, excluded: &Path) -> Result<u64, StoreError> {
        let mut total = 0u64;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path == excluded || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            total += entry.metadata().await?.len();
        }
        Ok(total)
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.key_path(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key);

        if let Some(quota) = self.quota {
            let needed = self.used_bytes(&path).await? + value.len() as u64;
            if needed > quota {
                return Err(StoreError::Capacity {
                    tier: self.name.clone(),
                    needed,
                    quota,
                });
            }
        }

        crate::paths::ensure_dir(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.key_path(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process key-value backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    name: String,
    quota: Option<u64>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(name: impl Into<String>, quota: Option<u64>) -> Self {
        Self {
            name: name.into(),
            quota,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Unavailable {
            tier: self.name.clone(),
            message: "lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.lock()?;

        if let Some(quota) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = (used + value.len()) as u64;
            if needed > quota {
                return Err(StoreError::Capacity {
                    tier: self.name.clone(),
                    needed,
                    quota,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        drop(entries);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

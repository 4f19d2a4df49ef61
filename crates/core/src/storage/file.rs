//! File-backed key-value store
//!
//! Persists the full key-value map as JSON in a single file. The map is
//! loaded into an in-memory cache at open and rewritten on every mutation.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::{Error, Result};

/// Durable key-value store using a JSON file
pub struct FileStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of entries
    cache: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Open a store at the given path.
    ///
    /// If the file doesn't exist, it will be created on first write. An
    /// existing but unparsable file is a storage error; the caller decides
    /// whether to delete and start over.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Storage(format!("Failed to read store file: {}", e)))?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Storage(format!("Failed to parse store file: {}", e)))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Persist the cache to disk
    async fn persist(&self) -> Result<()> {
        let cache = self.cache.read().await;
        let content = serde_json::to_string_pretty(&*cache)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write store file: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cache = self.cache.read().await;
        Ok(cache.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        {
            let mut cache = self.cache.write().await;
            cache.insert(key.to_string(), value.to_string());
        }
        self.persist().await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let removed = {
            let mut cache = self.cache.write().await;
            cache.remove(key).is_some()
        };
        if removed {
            self.persist().await?;
        }
        Ok(())
    }
}

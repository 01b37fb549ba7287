use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::{
    error::{Result, StudioError},
    storage::traits::KeyValueStore,
};

/// Stores entries as a flat JSON object on disk. A missing file reads as empty.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all entries. An unparseable file is discarded with a warning and
    /// reported through the returned flag so the next write replaces it.
    async fn load(&self) -> Result<(BTreeMap<String, String>, bool)> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok((BTreeMap::new(), false)),
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => Ok((entries, false)),
                Err(e) => {
                    log::warn!(
                        "Ignoring corrupt credential file {}: {}",
                        self.path.display(),
                        e
                    );
                    Ok((BTreeMap::new(), true))
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((BTreeMap::new(), false)),
            Err(e) => Err(StudioError::StorageError(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Writes a sibling temp file readable by the owner only, then renames it
    /// over the target.
    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StudioError::SerializationError(e.to_string()))?;

        let tmp = self.temp_path();
        write_private(&tmp, json.as_bytes()).await.map_err(|e| {
            StudioError::StorageError(format!("Failed to write {}: {}", tmp.display(), e))
        })?;

        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            StudioError::StorageError(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.load().await?;
        Ok(entries.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await?;
        log::debug!("Stored '{}' in {}", key, self.path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let (mut entries, discarded) = self.load().await?;
        if entries.remove(key).is_some() || discarded {
            self.save(&entries).await?;
            log::debug!("Removed '{}' from {}", key, self.path.display());
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

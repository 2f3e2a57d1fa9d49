use super::storage::ScopedStorage;
use crate::core::{ReconcileError, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// One JSON document per key inside `root`.
///
/// Keys are mapped to file names by replacing anything outside
/// `[A-Za-z0-9_.-]` with `_`, so two keys differing only in such characters
/// share a file.
#[derive(Debug, Clone)]
pub struct FileScopedStorage {
    root: PathBuf,
}

impl FileScopedStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }
}

#[async_trait]
impl ScopedStorage for FileScopedStorage {
    async fn save(&self, key: &str, value: JsonValue) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&value)?;
        atomic_write(&self.path_for(key), &bytes).await
    }

    async fn load(&self, key: &str) -> Result<Option<JsonValue>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ReconcileError::Storage(format!(
                    "Failed to read '{}': {}",
                    path.display(),
                    err
                )));
            }
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ReconcileError::Storage(format!(
                "Failed to remove '{}': {}",
                path.display(),
                err
            ))),
        }
    }
}

async fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|err| {
            ReconcileError::Storage(format!(
                "Failed to create parent directory '{}': {}",
                parent.display(),
                err
            ))
        })?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await.map_err(|err| {
        ReconcileError::Storage(format!(
            "Failed to write temp file '{}': {}",
            tmp.display(),
            err
        ))
    })?;

    fs::rename(&tmp, path).await.map_err(|err| {
        ReconcileError::Storage(format!(
            "Failed to rename temp file '{}' -> '{}': {}",
            tmp.display(),
            path.display(),
            err
        ))
    })?;
    Ok(())
}

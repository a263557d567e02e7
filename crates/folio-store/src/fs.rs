//! Filesystem-backed blob store.
//!
//! Keys are flat strings with `/` separators and map directly onto paths
//! under the data directory, e.g. `jobs/job_x.json` lands at
//! `<data_dir>/jobs/job_x.json`. Writes go to a temp file first and are
//! renamed into place so readers never observe a partial blob.

use std::path::{Component, Path, PathBuf};

use folio_core::{AppError, BlobStore};
use uuid::Uuid;

use crate::config::StoreConfig;

#[derive(Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            root: config.data_dir.clone(),
        }
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key to a path, rejecting anything that would escape the
    /// data directory.
    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(AppError::StorageError(format!("Invalid blob key: {key:?}")));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::StorageError(format!("Create {}: {e}", parent.display())))?;
        }

        let tmp = path.with_extension(format!("tmp.{}", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| AppError::StorageError(format!("Write {}: {e}", tmp.display())))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::StorageError(format!(
                "Rename into {}: {e}",
                path.display()
            )));
        }

        tracing::debug!(%key, bytes = bytes.len(), "Blob written");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::StorageError(format!(
                "Read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::StorageError(format!("Stat {}: {e}", path.display())))
    }
}

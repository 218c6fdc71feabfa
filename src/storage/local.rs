//! Local filesystem store.
//!
//! Every write goes to a sibling temp file first and is renamed into place,
//! so readers never observe a half-written artifact.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{ArtifactStore, PublishedFile};

/// Filesystem-backed artifact store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Resolve a relative key, refusing anything that could escape the root.
    fn path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !is_plain {
            return Err(AppError::publish(
                key,
                "path must be relative and stay inside the output directory",
            ));
        }
        Ok(self.root_dir.join(relative))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    async fn publish(&self, relative_path: &str, value: &Value) -> Result<PublishedFile> {
        let path = self.path(relative_path)?;
        let bytes = serde_json::to_vec_pretty(value)?;
        let changed = self.read_bytes(&path).await?.as_deref() != Some(bytes.as_slice());

        self.write_bytes(&path, &bytes)
            .await
            .map_err(|e| AppError::publish(relative_path, e))?;

        let absolute = std::path::absolute(&path)?;
        log::info!("Wrote: {}", absolute.display());

        Ok(PublishedFile {
            path: absolute,
            bytes: bytes.len(),
            sha256: hex::encode(Sha256::digest(&bytes)),
            changed,
        })
    }

    async fn load(&self, relative_path: &str) -> Result<Option<Value>> {
        let path = self.path(relative_path)?;
        match self.read_bytes(&path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

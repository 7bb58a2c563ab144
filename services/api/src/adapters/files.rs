//! services/api/src/adapters/files.rs
//!
//! The local-disk implementation of the `FileStore` port, built on `tokio::fs`.

use async_trait::async_trait;
use mentor_core::ports::{FileStore, PortError, PortResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Stages uploads under `upload_dir` and moves them wherever the caller asks.
#[derive(Clone, Debug)]
pub struct LocalFileStore {
    upload_dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Creates the staging directory and any extra directories (e.g. the
    /// avatar directory) the service writes into.
    pub async fn ensure_dirs(&self, extra: &[&Path]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        for dir in extra {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> PortError {
    match e.kind() {
        ErrorKind::NotFound => PortError::NotFound(path.display().to_string()),
        _ => PortError::Unexpected(format!("{}: {}", path.display(), e)),
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn stage_upload(&self, data: &[u8]) -> PortResult<PathBuf> {
        let path = self.upload_dir.join(Uuid::new_v4().simple().to_string());
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| io_error(&path, e))?;
        debug!("staged {} bytes at {}", data.len(), path.display());
        Ok(path)
    }

    async fn remove(&self, path: &Path) -> PortResult<()> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn rename(&self, from: &Path, to: &Path) -> PortResult<()> {
        tokio::fs::rename(from, to)
            .await
            .map_err(|e| io_error(from, e))
    }

    async fn read(&self, path: &Path) -> PortResult<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| io_error(path, e))
    }
}

use super::record::CredentialRecord;
use crate::error::FormsyncError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Single-record token persistence at a fixed path.
///
/// Every access goes through one async mutex; [`CredentialStore::lock`] hands out the guard
/// so callers can hold a load-check-refresh-save sequence as one critical section. Writes go
/// to a sibling temp file that is renamed over the target, so readers never see a torn record.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Exclusive access to the store for the lifetime of the guard.
pub struct StoreGuard<'a> {
    store: &'a CredentialStore,
    _guard: MutexGuard<'a, ()>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            store: self,
            _guard: self.lock.lock().await,
        }
    }

    pub async fn load(&self) -> Result<Option<CredentialRecord>, FormsyncError> {
        self.lock().await.load().await
    }

    pub async fn save(&self, record: &CredentialRecord) -> Result<(), FormsyncError> {
        self.lock().await.save(record).await
    }
}

impl StoreGuard<'_> {
    /// `Ok(None)` when no record has been written yet (the logged-out state).
    pub async fn load(&self) -> Result<Option<CredentialRecord>, FormsyncError> {
        let bytes = match tokio::fs::read(&self.store.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub async fn save(&self, record: &CredentialRecord) -> Result<(), FormsyncError> {
        let path = &self.store.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = temp_path_for(path);
        let payload = serde_json::to_vec_pretty(record)?;

        let write = async {
            let mut file = open_private(&tmp_path).await?;
            file.write_all(&payload).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, path).await
        };

        if let Err(e) = write.await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(path = %path.display(), "credential record saved");
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "token.json".to_string());
    path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
}

#[cfg(unix)]
async fn open_private(path: &Path) -> std::io::Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .await
}

#[cfg(not(unix))]
async fn open_private(path: &Path) -> std::io::Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

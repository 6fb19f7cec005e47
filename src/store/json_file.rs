//! JSON snapshot file backend.
//!
//! The whole collection lives in memory behind a single `RwLock` and is
//! written to disk as one JSON array after every mutation. The write guard
//! is held across mutate and persist, so writers are fully serialized while
//! readers always see a committed snapshot.
//!
//! # Crash Consistency
//!
//! Each write goes to a temporary file in the target directory, is flushed
//! with `fsync`, then renamed over the target. On Unix the directory is
//! synced after the rename so the new entry survives power loss. A crash
//! leaves either the old or the new snapshot on disk, never a torn file.
//!
//! Snapshots are checked against the record invariants when loaded; a file
//! that violates them is reported as corrupt instead of being served.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, sync::RwLock};
use uuid::Uuid;

use super::{LicenseStore, Mutation, Mutator};
use crate::{
    error::{AppError, StorageError},
    models::license::License,
};

/// License store backed by a JSON file (or by nothing, for tests).
#[derive(Debug)]
pub struct JsonFileStore {
    path: Option<PathBuf>,
    licenses: RwLock<Vec<License>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading the existing snapshot if present.
    ///
    /// A missing file starts an empty store. The parent directory is
    /// created if needed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file exists but cannot be read, does
    /// not contain a valid license array, or breaks a record invariant.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let licenses = match tokio::fs::read(&path).await {
            Ok(raw) => {
                let licenses = serde_json::from_slice::<Vec<License>>(&raw)?;
                check_snapshot(&licenses)?;
                licenses
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "license file not found, starting empty");
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            path = %path.display(),
            count = licenses.len(),
            "license store loaded"
        );

        Ok(Self {
            path: Some(path),
            licenses: RwLock::new(licenses),
        })
    }

    /// Store that keeps everything in memory and never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            licenses: RwLock::new(Vec::new()),
        }
    }

    /// Write the full collection: temp file, fsync, rename.
    async fn persist(&self, licenses: &[License]) -> Result<(), AppError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let payload = serde_json::to_vec_pretty(licenses)?;

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let written = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&payload).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp_path, path).await
        }
        .await;

        if let Err(err) = written {
            // Best effort; the target file is untouched either way.
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(err.into());
        }

        // The new snapshot is already visible; memory keeps the new state.
        if let Err(err) = sync_parent_dir(path).await {
            tracing::warn!(path = %path.display(), error = %err, "failed to sync license directory");
        }

        Ok(())
    }
}

/// Reject snapshots that break a record invariant or reuse a key or id.
fn check_snapshot(licenses: &[License]) -> Result<(), StorageError> {
    let mut ids = HashSet::with_capacity(licenses.len());
    let mut keys = HashSet::with_capacity(licenses.len());

    for license in licenses {
        license.check_invariants().map_err(StorageError::Corrupt)?;
        if !ids.insert(license.id) {
            return Err(StorageError::Corrupt(format!(
                "license id {} appears twice",
                license.id
            )));
        }
        if !keys.insert(license.key.as_str()) {
            return Err(StorageError::Corrupt(format!(
                "license key of {} is already used",
                license.id
            )));
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tokio::fs::File::open(parent).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl LicenseStore for JsonFileStore {
    async fn list_all(&self) -> Result<Vec<License>, AppError> {
        Ok(self.licenses.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<License>, AppError> {
        let licenses = self.licenses.read().await;
        Ok(licenses.iter().find(|l| l.id == id).cloned())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<License>, AppError> {
        let key = License::normalize_key(key);
        let licenses = self.licenses.read().await;
        Ok(licenses
            .iter()
            .find(|l| l.key.eq_ignore_ascii_case(&key))
            .cloned())
    }

    async fn insert(&self, license: License) -> Result<(), AppError> {
        let mut licenses = self.licenses.write().await;

        if licenses
            .iter()
            .any(|l| l.key.eq_ignore_ascii_case(&license.key))
        {
            return Err(AppError::DuplicateKey);
        }

        licenses.push(license);
        if let Err(err) = self.persist(&licenses).await {
            licenses.pop();
            return Err(err);
        }

        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        mutator: Mutator<'_>,
    ) -> Result<(License, Mutation), AppError> {
        let mut licenses = self.licenses.write().await;

        let index = licenses
            .iter()
            .position(|l| l.id == id)
            .ok_or(AppError::LicenseNotFound)?;

        // Mutate a copy so a failing mutator cannot leave partial changes.
        let mut candidate = licenses[index].clone();
        let mutation = mutator(&mut candidate)?;

        if mutation == Mutation::Unchanged {
            return Ok((candidate, mutation));
        }

        let previous = std::mem::replace(&mut licenses[index], candidate.clone());
        if let Err(err) = self.persist(&licenses).await {
            licenses[index] = previous;
            return Err(err);
        }

        Ok((candidate, mutation))
    }

    async fn remove(&self, id: Uuid) -> Result<License, AppError> {
        let mut licenses = self.licenses.write().await;

        let index = licenses
            .iter()
            .position(|l| l.id == id)
            .ok_or(AppError::LicenseNotFound)?;

        let removed = licenses.remove(index);
        if let Err(err) = self.persist(&licenses).await {
            licenses.insert(index, removed);
            return Err(err);
        }

        Ok(removed)
    }

    async fn check_health(&self) -> Result<(), AppError> {
        Ok(())
    }
}

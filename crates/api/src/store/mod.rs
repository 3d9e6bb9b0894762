//! File-backed document store.
//!
//! Records are JSON documents addressed by `(collection, key)` and stored as
//! `<data_root>/<collection>/<key>.json`. Collections are directories that
//! are created at startup; records come and go independently underneath
//! them. There is no locking: two writers racing on the same key resolve as
//! last-writer-wins, which callers must account for.
//!
//! Every operation logs its failure to the error log; expected-miss reads
//! (does this user have a cart yet?) go through [`FileStore::silent`] to
//! keep the log meaningful.

pub mod log;

pub use log::ErrorLog;

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Suffix of every record file. `list` filters on it so stray files in a
/// collection directory are invisible to callers.
const FILE_SUFFIX: &str = ".json";

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record file for the key, the collection directory is missing, or
    /// the file content is not valid JSON.
    #[error("record not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    /// Exclusive create on a key that already has a record.
    #[error("record already exists: {collection}/{key}")]
    AlreadyExists { collection: String, key: String },

    /// The key contains characters that cannot name a record file.
    #[error("invalid record key: {key:?}")]
    InvalidKey { key: String },

    /// The file holds valid JSON that does not decode into the expected
    /// record shape.
    #[error("corrupt record {collection}/{key}: {detail}")]
    Corrupt {
        collection: String,
        key: String,
        detail: String,
    },

    /// The value could not be serialized to JSON.
    #[error("could not encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Unexpected filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata about a stored record.
#[derive(Debug, Clone, Copy)]
pub struct RecordStat {
    /// Creation time, falling back to the modification time on filesystems
    /// that do not track birth times.
    pub created: SystemTime,
    /// Last modification time.
    pub modified: SystemTime,
    /// File size in bytes.
    pub size: u64,
}

impl RecordStat {
    /// Whether the record was created within the trailing `window` - used to
    /// select "latest" records over a rolling period.
    #[must_use]
    pub fn created_within(&self, window: Duration) -> bool {
        SystemTime::now()
            .duration_since(self.created)
            .is_ok_and(|age| age <= window)
    }
}

/// File-backed document store rooted at a data directory.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
    errors: ErrorLog,
    log_failures: bool,
}

impl FileStore {
    /// Create a store over `root`, reporting failures to `errors`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, errors: ErrorLog) -> Self {
        Self {
            root: root.into(),
            errors,
            log_failures: true,
        }
    }

    /// A view of the store that does not log failures.
    ///
    /// For reads where a miss is part of normal control flow.
    #[must_use]
    pub fn silent(&self) -> Self {
        Self {
            root: self.root.clone(),
            errors: self.errors.clone(),
            log_failures: false,
        }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Create a new record. Fails if the key already has one; never
    /// overwrites silently.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if a record file is present, `InvalidKey`/`Encode`/
    /// `Io` otherwise.
    pub async fn create<T: Serialize>(
        &self,
        collection: &str,
        key: &str,
        data: &T,
    ) -> Result<(), StoreError> {
        let result = self.create_impl(collection, key, data).await;
        self.report(result).await
    }

    async fn create_impl<T: Serialize>(
        &self,
        collection: &str,
        key: &str,
        data: &T,
    ) -> Result<(), StoreError> {
        let path = self.record_path(collection, key)?;
        let body = serde_json::to_vec(data)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StoreError::AlreadyExists {
                    collection: collection.to_owned(),
                    key: key.to_owned(),
                },
                _ => StoreError::Io(e),
            })?;

        file.write_all(&body).await?;
        file.flush().await?;
        Ok(())
    }

    /// Read and decode a record.
    ///
    /// # Errors
    ///
    /// `NotFound` if the file is absent or does not hold valid JSON,
    /// `Corrupt` if the JSON does not match the expected shape.
    pub async fn read<T: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<T, StoreError> {
        let result = self.read_impl(collection, key).await;
        self.report(result).await
    }

    async fn read_impl<T: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<T, StoreError> {
        let path = self.record_path(collection, key)?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| self.missing(collection, key, e))?;

        // A half-written or hand-mangled file reads as "no record" rather
        // than a decode failure; a syntactically valid record with the wrong
        // shape is corruption and surfaces as such.
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|_| StoreError::NotFound {
                collection: collection.to_owned(),
                key: key.to_owned(),
            })?;

        serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
            collection: collection.to_owned(),
            key: key.to_owned(),
            detail: e.to_string(),
        })
    }

    /// Replace a record's content wholesale (truncate-then-write, not a
    /// patch). Concurrent updates to one key are not serialized.
    ///
    /// # Errors
    ///
    /// `NotFound` if the record does not exist yet.
    pub async fn update<T: Serialize>(
        &self,
        collection: &str,
        key: &str,
        data: &T,
    ) -> Result<(), StoreError> {
        let result = self.update_impl(collection, key, data).await;
        self.report(result).await
    }

    async fn update_impl<T: Serialize>(
        &self,
        collection: &str,
        key: &str,
        data: &T,
    ) -> Result<(), StoreError> {
        let path = self.record_path(collection, key)?;
        let body = serde_json::to_vec(data)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .await
            .map_err(|e| self.missing(collection, key, e))?;

        file.write_all(&body).await?;
        file.flush().await?;
        Ok(())
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is nothing to delete.
    pub async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let result = self.delete_impl(collection, key).await;
        self.report(result).await
    }

    async fn delete_impl(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let path = self.record_path(collection, key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| self.missing(collection, key, e))
    }

    /// List the keys of a collection, extension stripped and sorted.
    ///
    /// # Errors
    ///
    /// `NotFound` if the collection directory is absent - callers that
    /// tolerate "no collection yet" map this to an empty list.
    pub async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let result = self.list_impl(collection).await;
        self.report(result).await
    }

    async fn list_impl(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.root.join(collection);

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| self.missing(collection, "", e))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(key) = name.strip_suffix(FILE_SUFFIX) {
                keys.push(key.to_owned());
            }
        }

        keys.sort_unstable();
        Ok(keys)
    }

    /// Metadata for a record.
    ///
    /// # Errors
    ///
    /// `NotFound` if the record does not exist.
    pub async fn stat(&self, collection: &str, key: &str) -> Result<RecordStat, StoreError> {
        let result = self.stat_impl(collection, key).await;
        self.report(result).await
    }

    async fn stat_impl(&self, collection: &str, key: &str) -> Result<RecordStat, StoreError> {
        let path = self.record_path(collection, key)?;

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| self.missing(collection, key, e))?;

        let modified = meta.modified()?;
        Ok(RecordStat {
            created: meta.created().unwrap_or(modified),
            modified,
            size: meta.len(),
        })
    }

    /// Duplicate a record into another collection, optionally removing the
    /// source - the store's only cross-collection operation.
    ///
    /// With `mv` set this is an atomic rename when both collections live on
    /// the same volume. Across volumes it degrades to copy-then-delete, so a
    /// crash between the two steps can leave the record in both collections;
    /// reconciling that is the caller's concern, not the store's.
    ///
    /// # Errors
    ///
    /// `NotFound` if the source record is absent.
    pub async fn move_or_copy(
        &self,
        src_collection: &str,
        dest_collection: &str,
        key: &str,
        mv: bool,
    ) -> Result<(), StoreError> {
        let result = self
            .move_or_copy_impl(src_collection, dest_collection, key, mv)
            .await;
        self.report(result).await
    }

    async fn move_or_copy_impl(
        &self,
        src_collection: &str,
        dest_collection: &str,
        key: &str,
        mv: bool,
    ) -> Result<(), StoreError> {
        let src = self.record_path(src_collection, key)?;
        let dest = self.record_path(dest_collection, key)?;

        if !mv {
            tokio::fs::copy(&src, &dest)
                .await
                .map_err(|e| self.missing(src_collection, key, e))?;
            return Ok(());
        }

        match tokio::fs::rename(&src, &dest).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(self.missing(src_collection, key, e))
            }
            // Rename cannot cross filesystems; fall back to the two-step
            // form and accept the duplication window.
            Err(_) => {
                tokio::fs::copy(&src, &dest)
                    .await
                    .map_err(|e| self.missing(src_collection, key, e))?;
                tokio::fs::remove_file(&src).await?;
                Ok(())
            }
        }
    }

    /// Resolve a record path, rejecting keys that could escape the
    /// collection directory or hide from `list`.
    fn record_path(&self, collection: &str, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '+' | '-'));

        if !valid {
            return Err(StoreError::InvalidKey {
                key: key.to_owned(),
            });
        }

        Ok(self.root.join(collection).join(format!("{key}{FILE_SUFFIX}")))
    }

    fn missing(&self, collection: &str, key: &str, e: std::io::Error) -> StoreError {
        if e.kind() == ErrorKind::NotFound {
            StoreError::NotFound {
                collection: collection.to_owned(),
                key: key.to_owned(),
            }
        } else {
            StoreError::Io(e)
        }
    }

    async fn report<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if self.log_failures
            && let Err(err) = &result
        {
            self.errors.append(&err.to_string()).await;
        }
        result
    }
}

//! Append-only error log.
//!
//! One newline-delimited JSON object per failure, `{"timestamp", "error"}`,
//! written under a log root separate from the record store. A background
//! worker periodically rotates the live file into a gzip archive so the log
//! never grows without bound.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

/// Name of the live log file.
pub const LOG_FILE: &str = "errors.log";

/// A single log line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the failure was recorded.
    pub timestamp: DateTime<Utc>,
    /// Failure description.
    pub error: String,
}

/// Handle to the error log directory.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    dir: PathBuf,
}

impl ErrorLog {
    /// Create a handle rooted at `dir`. The directory is created lazily on
    /// first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the live log file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    /// Append a failure to the log.
    ///
    /// Logging must never take a request down with it, so failures to write
    /// the log are reported on the tracing output and otherwise swallowed.
    pub async fn append(&self, error: &str) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            error: error.to_owned(),
        };

        if let Err(e) = self.try_append(&entry).await {
            tracing::warn!(error = %e, "could not append to error log");
        }
    }

    async fn try_append(&self, entry: &LogEntry) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut line = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.path())
            .await?;

        tokio::io::AsyncWriteExt::write_all(&mut file, line.as_bytes()).await
    }

    /// Rotate the live log into a timestamped gzip archive and truncate it.
    ///
    /// Returns the archive path, or `None` when there was nothing to rotate.
    ///
    /// # Errors
    ///
    /// Returns the underlying i/o error if the archive cannot be written.
    pub async fn rotate(&self) -> std::io::Result<Option<PathBuf>> {
        let live = self.path();

        let content = match tokio::fs::read(&live).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        if content.is_empty() {
            return Ok(None);
        }

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
        let archive = self.dir.join(format!("errors-{stamp}.log.gz"));

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&content)?;
        let compressed = encoder.finish()?;

        tokio::fs::write(&archive, compressed).await?;
        tokio::fs::write(&live, b"").await?;

        Ok(Some(archive))
    }

    /// Decompress a rotated archive back into its NDJSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying i/o error if the archive cannot be read or is
    /// not valid gzip.
    pub async fn read_archive(path: &Path) -> std::io::Result<String> {
        use std::io::Read;

        let compressed = tokio::fs::read(path).await?;
        let mut decoder = flate2::read::GzDecoder::new(compressed.as_slice());
        let mut text = String::new();
        decoder.read_to_string(&mut text)?;
        Ok(text)
    }
}

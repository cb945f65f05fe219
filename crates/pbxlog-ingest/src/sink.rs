//! Side files written during ingestion
//!
//! `RawMirror` keeps a byte-exact copy of the stream as framed, `ErrorSink`
//! collects the records that failed validation. Both are optional and both
//! flush every entry to disk.

use crate::constants::RECORD_DELIMITER;
use pbxlog_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

async fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}

/// Treat an empty configured path like an absent one
fn configured(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// Append-only copy of every framed record
#[derive(Debug)]
pub struct RawMirror {
    file: Option<File>,
    path: Option<PathBuf>,
}

impl RawMirror {
    pub fn disabled() -> Self {
        Self {
            file: None,
            path: None,
        }
    }

    /// Open the mirror file for appending.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if a configured file cannot be opened.
    pub async fn open(path: Option<&Path>) -> AppResult<Self> {
        let Some(path) = configured(path) else {
            return Ok(Self::disabled());
        };

        let file = open_append(path).await.map_err(|e| {
            AppError::Io(format!("Failed to open dump file {}: {}", path.display(), e))
        })?;
        info!("Mirroring PABX stream to {}", path.display());

        Ok(Self {
            file: Some(file),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    /// Append `record` and its delimiter, then flush to disk.
    ///
    /// Failures are logged; the mirror never stops ingestion.
    pub async fn write_record(&mut self, record: &[u8]) {
        let Some(file) = self.file.as_mut() else {
            return;
        };

        let result = async {
            file.write_all(record).await?;
            file.write_all(&[RECORD_DELIMITER]).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        if let Err(e) = result {
            warn!(path = ?self.path, "Failed to mirror record: {}", e);
        }
    }
}

/// Diagnostic dump of records that matched no known format
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    path: Option<PathBuf>,
}

impl ErrorSink {
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: configured(path).map(Path::to_path_buf),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Build the diagnostic block for one rejected record.
    ///
    /// `len` is the length that failed validation. When a banner was cut
    /// first it differs from `raw.len()`, and both are written.
    pub fn format_entry(raw: &[u8], len: usize) -> Vec<u8> {
        let header = if raw.len() == len {
            format!("\nError: len = {}\n--\n", len)
        } else {
            format!("\nError: len = {} (raw {})\n--\n", len, raw.len())
        };
        let mut entry = header.into_bytes();
        entry.extend_from_slice(raw);
        entry.extend_from_slice(b"\n--\n");
        entry
    }

    /// Append a diagnostic block for `raw`. Never fails.
    ///
    /// The file is reopened per entry so external rotation is picked up.
    pub async fn record(&self, raw: &[u8], len: usize) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        let entry = Self::format_entry(raw, len);
        let result = async {
            let mut file = open_append(path).await?;
            file.write_all(&entry).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        if let Err(e) = result {
            warn!(path = %path.display(), "Failed to write error entry: {}", e);
        }
    }
}

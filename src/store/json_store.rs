//! RecordStore — a pretty-printed JSON array on disk, shared by all accounts.
//!
//! Append is read-whole / concat / write-whole. Writes land in a sibling
//! temp file and are renamed into place. One async mutex serialises every
//! append and clear.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::records::EmailRecord;
use crate::error::StoreError;

/// JSON-file record store.
pub struct RecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents. A missing or unreadable file reads as empty.
    pub async fn records(&self) -> Vec<EmailRecord> {
        let _guard = self.write_lock.lock().await;
        self.load().await
    }

    /// Append `records` and return the new total.
    ///
    /// An empty batch leaves the file untouched.
    pub async fn append(&self, records: &[EmailRecord]) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut all = self.load().await;
        if records.is_empty() {
            return Ok(all.len());
        }

        all.extend_from_slice(records);
        let json = serde_json::to_string_pretty(&all)?;
        self.write_atomic(json.as_bytes()).await?;

        info!(
            path = %self.path.display(),
            "Appended {} emails (Total: {} emails)",
            records.len(),
            all.len()
        );
        Ok(all.len())
    }

    /// Delete the backing file. A missing file is not an error.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Cleared record store");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }

    async fn load(&self) -> Vec<EmailRecord> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read record store; treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed record store; treating as empty");
                Vec::new()
            }
        }
    }

    async fn write_atomic(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.io_err(e))?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, bytes).await.map_err(|e| StoreError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| self.io_err(e))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Wrote record store");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "records.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

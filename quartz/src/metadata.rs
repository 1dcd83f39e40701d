use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Error, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Suffix appended to a logical key to form the metadata sidecar filename.
pub const META_SUFFIX: &str = ".meta";

/// Per-key bookkeeping record, stored as a JSON sidecar next to the blob.
///
/// `size` is the number of compressed bytes the store wrote, not the size of
/// the original payload. `created_at` is reset on every overwrite, which also
/// restarts the entry's retention clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub size: u64,
}

/// Tracks creation time and stored size per key, independent of the blob
/// artifacts, so the reaper can scan ages without decompressing anything.
pub struct MetadataLedger {
    dir: PathBuf,
}

impl MetadataLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{META_SUFFIX}"))
    }

    /// Record `{key, created_at: now, size}`, overwriting any prior record.
    pub async fn save(&self, key: &str, size: u64) -> Result<()> {
        let record = EntryMetadata {
            key: key.to_string(),
            created_at: Utc::now(),
            size,
        };
        let body = serde_json::to_vec(&record)
            .map_err(|e| Error::MetadataWrite(format!("failed to serialize record: {e}")))?;

        let dir = self.dir.clone();
        let dest = self.meta_path(key);
        tokio::task::spawn_blocking(move || write_record(&dir, &dest, &body))
            .await
            .map_err(|e| Error::MetadataWrite(format!("write task failed: {e}")))?
    }

    /// Read the record for `key`. Absent and malformed sidecars both read as
    /// `NotFound`; callers treat either as "age unknown".
    pub async fn load(&self, key: &str) -> Result<EntryMetadata> {
        let raw = tokio::fs::read(self.meta_path(key))
            .await
            .map_err(|_| Error::NotFound)?;
        serde_json::from_slice(&raw).map_err(|_| Error::NotFound)
    }

    /// Remove the sidecar for `key`.
    pub async fn delete(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.meta_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound),
            Err(e) => Err(Error::MetadataWrite(format!(
                "failed to delete metadata for {key}: {e}"
            ))),
        }
    }
}

impl std::fmt::Debug for MetadataLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataLedger")
            .field("dir", &self.dir)
            .finish()
    }
}

fn write_record(dir: &Path, dest: &Path, body: &[u8]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::MetadataWrite(format!("failed to create temp file: {e}")))?;
    tmp.write_all(body)
        .map_err(|e| Error::MetadataWrite(format!("failed to write record: {e}")))?;
    tmp.persist(dest)
        .map_err(|e| Error::MetadataWrite(format!("failed to publish {}: {}", dest.display(), e)))?;
    Ok(())
}

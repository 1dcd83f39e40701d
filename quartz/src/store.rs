use bytes::Bytes;
use dashmap::DashMap;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use shared::{Error, Result};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::metadata::META_SUFFIX;

/// Suffix appended to a logical key to form the blob artifact filename.
pub const BLOB_SUFFIX: &str = ".gz";

/// Durable, compressed, keyed byte storage backed by a single directory.
///
/// Every blob is stored gzip-compressed at `<dir>/<key>.gz`. Writes are
/// published atomically (temp file + rename), so readers never observe a
/// half-written artifact. Operations on the same key are serialized through
/// a per-key lock table; operations on different keys run concurrently.
pub struct ObjectStore {
    dir: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ObjectStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::StorageWrite(format!("failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir,
            locks: DashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{BLOB_SUFFIX}"))
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.entry(key.to_string()).or_default().clone()
    }

    /// Drop this task's handle to the key's lock and reclaim the table entry
    /// if no other task holds one. Keys are unbounded (content hashes), so
    /// the table must not grow with every key ever touched.
    fn release_lock(&self, key: &str, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks
            .remove_if(key, |_, entry| Arc::strong_count(entry) == 1);
    }

    /// Compress `payload` and store it under `key`, fully replacing any prior
    /// artifact. Returns the number of compressed bytes written.
    pub async fn put(&self, key: &str, payload: Bytes) -> Result<u64> {
        let lock = self.key_lock(key);
        let guard = lock.lock().await;

        let dir = self.dir.clone();
        let dest = self.blob_path(key);
        let result = match tokio::task::spawn_blocking(move || write_compressed(&dir, &dest, &payload)).await
        {
            Ok(result) => result,
            Err(e) => Err(Error::StorageWrite(format!("compression task failed: {e}"))),
        };

        drop(guard);
        self.release_lock(key, lock);
        result
    }

    /// Store `payload` under its own lowercase hex SHA-256 digest.
    /// Returns the derived key and the number of compressed bytes written.
    pub async fn put_hashed(&self, payload: Bytes) -> Result<(String, u64)> {
        let key = hex::encode(Sha256::digest(&payload));
        let written = self.put(&key, payload).await?;
        Ok((key, written))
    }

    /// Fetch and decompress the blob stored under `key`.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let lock = self.key_lock(key);
        let guard = lock.lock().await;

        let path = self.blob_path(key);
        let result = match tokio::task::spawn_blocking(move || read_decompressed(&path)).await {
            Ok(result) => result,
            Err(e) => Err(Error::CorruptArtifact(format!(
                "decompression task failed: {e}"
            ))),
        };

        drop(guard);
        self.release_lock(key, lock);
        result
    }

    /// True iff an artifact is present for `key`. Does not open the blob.
    pub async fn exists(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.blob_path(key))
            .await
            .unwrap_or(false)
    }

    /// Remove the artifact for `key`.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let lock = self.key_lock(key);
        let guard = lock.lock().await;

        let result = match tokio::fs::remove_file(self.blob_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound),
            Err(e) => Err(Error::StorageWrite(format!(
                "failed to delete artifact for {key}: {e}"
            ))),
        };

        drop(guard);
        self.release_lock(key, lock);
        result
    }

    /// Enumerate the logical keys of all stored blobs, sorted.
    ///
    /// Metadata sidecars and in-flight temp files are excluded, and the
    /// compression suffix is stripped so callers see keys, not filenames.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| Error::DirectoryRead(format!("{}: {}", self.dir.display(), e)))?;

        let mut keys = Vec::new();
        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|e| Error::DirectoryRead(format!("{}: {}", self.dir.display(), e)))?;
            let Some(entry) = entry else { break };

            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Error::DirectoryRead(format!("{}: {}", self.dir.display(), e)))?;
            if !file_type.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Hidden files are unpublished temp artifacts.
            if name.starts_with('.') || name.ends_with(META_SUFFIX) {
                continue;
            }

            let key = name.strip_suffix(BLOB_SUFFIX).unwrap_or(name);
            keys.push(key.to_string());
        }

        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("dir", &self.dir)
            .finish()
    }
}

fn write_compressed(dir: &Path, dest: &Path, payload: &[u8]) -> Result<u64> {
    let tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::StorageWrite(format!("failed to create temp file: {e}")))?;

    let mut encoder = GzEncoder::new(tmp, Compression::default());
    encoder
        .write_all(payload)
        .map_err(|e| Error::StorageWrite(format!("failed to compress payload: {e}")))?;
    let tmp = encoder
        .finish()
        .map_err(|e| Error::StorageWrite(format!("failed to finish compression: {e}")))?;

    let written = tmp
        .as_file()
        .metadata()
        .map_err(|e| Error::StorageWrite(format!("failed to stat temp file: {e}")))?
        .len();

    // Atomic publish: the old artifact, if any, is replaced in one rename.
    tmp.persist(dest)
        .map_err(|e| Error::StorageWrite(format!("failed to publish {}: {}", dest.display(), e)))?;

    Ok(written)
}

fn read_decompressed(path: &Path) -> Result<Vec<u8>> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::NotFound),
        Err(e) => {
            return Err(Error::StorageWrite(format!(
                "failed to open {}: {}",
                path.display(),
                e
            )));
        }
    };

    let mut payload = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut payload)
        .map_err(|e| Error::CorruptArtifact(format!("{}: {}", path.display(), e)))?;
    Ok(payload)
}

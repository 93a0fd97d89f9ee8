//! File-per-key durable store.
//!
//! Layout: `{root}/{hex[0..2]}/{hex}.rkyv`. Writes go to a sibling temp file that
//! is fsynced and renamed over the target, so readers see either the old or the
//! new entry and never a partial one.


use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rkyv::rancor::Error as RkyvError;
use rkyv::to_bytes;
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::mmap::{MmapError, MmapFileHandle};
use super::model::{ArchivedCacheEntry, CacheEntry};
use crate::hashing::ClaimKey;

const RKYV_EXTENSION: &str = "rkyv";

const TEMP_EXTENSION: &str = "rkyv.tmp";

#[derive(Debug, Clone)]
/// Stores and retrieves [`CacheEntry`] records on disk.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if missing.
    pub fn ensure_root(&self) -> StorageResult<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|_| StorageError::StorageUnavailable {
                path: self.root.clone(),
            })?;
        }
        Ok(())
    }

    fn shard_path(&self, hex: &str) -> PathBuf {
        self.root.join(&hex[..2])
    }

    fn entry_path(&self, key: &ClaimKey) -> PathBuf {
        let hex = key.to_hex();
        self.shard_path(&hex)
            .join(format!("{}.{}", hex, RKYV_EXTENSION))
    }

    fn temp_entry_path(&self, key: &ClaimKey) -> PathBuf {
        let hex = key.to_hex();
        self.shard_path(&hex)
            .join(format!("{}.{}", hex, TEMP_EXTENSION))
    }

    /// Writes `entry` under its key, replacing any previous entry. Returns bytes written.
    pub fn store(&self, entry: &CacheEntry) -> StorageResult<usize> {
        let key = ClaimKey::from_bytes(entry.key);
        let final_path = self.entry_path(&key);
        let temp_path = self.temp_entry_path(&key);

        if let Some(shard) = final_path.parent() {
            fs::create_dir_all(shard)?;
        }

        let bytes = to_bytes::<RkyvError>(entry)
            .map_err(|e| StorageError::Serialization(format!("{:?}", e)))?;

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(key = %key, bytes = bytes.len(), "Stored entry");
        Ok(bytes.len())
    }

    /// Loads the entry for `key`, or `None` if absent.
    ///
    /// Bytes that fail validation yield [`StorageError::Corrupted`].
    pub fn load(&self, key: &ClaimKey) -> StorageResult<Option<CacheEntry>> {
        let path = self.entry_path(key);

        let handle = match MmapFileHandle::open(&path) {
            Ok(handle) => handle,
            Err(MmapError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(MmapError::EmptyFile) => {
                return Err(StorageError::Corrupted {
                    key: key.to_hex(),
                    reason: "empty file".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let archived = handle
            .access_archived::<ArchivedCacheEntry>()
            .map_err(|e| StorageError::Corrupted {
                key: key.to_hex(),
                reason: e.to_string(),
            })?;

        let entry = rkyv::deserialize::<CacheEntry, RkyvError>(archived)
            .map_err(|e| StorageError::Serialization(format!("{:?}", e)))?;

        if entry.key != *key.as_bytes() {
            return Err(StorageError::Corrupted {
                key: key.to_hex(),
                reason: "stored key does not match file name".to_string(),
            });
        }

        Ok(Some(entry))
    }

    /// Removes the entry for `key`. Returns `false` if nothing was there.
    pub fn delete(&self, key: &ClaimKey) -> StorageResult<bool> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, key: &ClaimKey) -> bool {
        self.entry_path(key).exists()
    }

    /// Lists every stored key. Temp files and foreign files are ignored.
    pub fn list_keys(&self) -> StorageResult<Vec<ClaimKey>> {
        let mut keys = Vec::new();

        for path in self.entry_files()? {
            if let Some(stem) = path.file_stem()
                && let Some(hex) = stem.to_str()
                && let Some(key) = ClaimKey::from_hex(hex)
            {
                keys.push(key);
            }
        }

        Ok(keys)
    }

    fn entry_files(&self) -> StorageResult<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();

        for shard in fs::read_dir(&self.root)? {
            let shard = shard?.path();
            if !shard.is_dir() {
                continue;
            }

            for entry in fs::read_dir(&shard)? {
                let path = entry?.path();

                // `x.rkyv.tmp` has extension `tmp`, so it is skipped here
                if path.extension().is_some_and(|ext| ext == RKYV_EXTENSION) {
                    files.push(path);
                }
            }
        }

        Ok(files)
    }

    /// Removes empty shard directories and returns the count removed.
    pub fn cleanup_empty_shards(&self) -> StorageResult<usize> {
        if !self.root.exists() {
            return Ok(0);
        }

        let mut removed = 0;

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();

            if path.is_dir() && fs::read_dir(&path)?.next().is_none() {
                fs::remove_dir(&path)?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Scans the tree for entry count and size.
    pub fn stats(&self) -> StorageResult<StorageStats> {
        let files = self.entry_files()?;
        let total_bytes = files
            .iter()
            .filter_map(|path| fs::metadata(path).ok())
            .map(|m| m.len())
            .sum();

        Ok(StorageStats {
            entry_count: files.len(),
            total_bytes,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Aggregate stats for the store directory.
pub struct StorageStats {
    pub entry_count: usize,
    pub total_bytes: u64,
}

use thiserror::Error;

use crate::storage::mmap::MmapError;

#[derive(Error, Debug)]
/// Errors returned by the durable store.
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("mmap error: {0}")]
    Mmap(#[from] MmapError),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The entry exists but its bytes do not validate.
    #[error("corrupted entry {key}: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("storage path unavailable: {path}")]
    StorageUnavailable { path: std::path::PathBuf },

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    TaskFailed(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

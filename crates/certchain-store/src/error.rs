//! # Store Error Types
//!
//! [`StorageWriteError`] is returned by `put` and crosses the submission
//! boundary, so it carries a stable [`kind()`](StorageWriteError::kind).
//! [`StoreError`] covers opening and loading a snapshot file.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A `put` that did not durably land.
///
/// When this is returned the caller must not commit the hash anywhere: the
/// entry may be absent after restart.
#[derive(Error, Debug)]
pub enum StorageWriteError {
    /// Filesystem failure while writing the snapshot.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be serialized.
    #[error("failed to serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The write did not finish within the configured bound.
    #[error("storage write did not complete within {0:?}")]
    Timeout(Duration),

    /// The caller gave up on the write before it became visible. Nothing
    /// was written.
    #[error("storage write abandoned before it became visible")]
    Abandoned,

    /// The blocking write task was cancelled or panicked.
    #[error("storage write task failed: {0}")]
    Interrupted(String),
}

impl StorageWriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Machine-readable kind: `io_failure` or `serialization_failure`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "serialization_failure",
            Self::Io { .. } | Self::Timeout(_) | Self::Abandoned | Self::Interrupted(_) => {
                "io_failure"
            }
        }
    }
}

/// Failure to open a store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No snapshot at the path and the caller asked not to create one.
    #[error("no record store at {}", .path.display())]
    Missing { path: PathBuf },

    /// The file exists but is not a readable snapshot.
    #[error("corrupt snapshot {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("unsupported snapshot version {version} in {}", .path.display())]
    UnsupportedVersion { path: PathBuf, version: u64 },

    /// Writing the initial empty snapshot failed.
    #[error(transparent)]
    Write(#[from] StorageWriteError),
}

//! # Blob Store
//!
//! Directory-backed storage for certificate PDFs and student photos. The
//! record core only ever sees the [`BlobRef`] returned here.
//!
//! Stored names are `{kind}-{uuid}{.ext}`. The extension is taken from the
//! client's file name when it is short and alphanumeric; the rest of the
//! client's name is discarded. Files are written under a hidden temp name and
//! renamed, so the static file server never serves a partial upload.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use certchain_core::{BlobKind, BlobRef, ValidationError};
use thiserror::Error;
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 8;

/// Blob upload failure.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("{kind} must be {expected}, got {content_type:?}")]
    UnsupportedMediaType {
        kind: BlobKind,
        expected: &'static str,
        content_type: String,
    },

    #[error("{kind} exceeds the {limit} byte limit")]
    TooLarge { kind: BlobKind, limit: usize },

    #[error("{kind} upload is empty")]
    Empty { kind: BlobKind },

    #[error("blob I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    InvalidRef(#[from] ValidationError),
}

impl BlobError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType { .. } => "invalid_media_type",
            Self::TooLarge { .. } => "payload_too_large",
            Self::Empty { .. } => "empty_blob",
            Self::Io { .. } => "io_failure",
            Self::InvalidRef(e) => e.kind(),
        }
    }
}

/// Filesystem blob store rooted at one directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl BlobStore {
    /// Open (and create if needed) the blob directory.
    pub fn open(dir: impl Into<PathBuf>, max_bytes: usize) -> Result<Self, BlobError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| BlobError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check media type and size without writing anything.
    pub fn check(
        &self,
        kind: BlobKind,
        content_type: Option<&str>,
        len: usize,
    ) -> Result<(), BlobError> {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let (accepted, expected) = match kind {
            BlobKind::Pdf => (essence == "application/pdf", "application/pdf"),
            BlobKind::Photo => (
                essence.starts_with("image/") && essence.len() > "image/".len(),
                "image/*",
            ),
        };
        if !accepted {
            return Err(BlobError::UnsupportedMediaType {
                kind,
                expected,
                content_type: content_type.unwrap_or_default().to_string(),
            });
        }
        if len == 0 {
            return Err(BlobError::Empty { kind });
        }
        if len > self.max_bytes {
            return Err(BlobError::TooLarge {
                kind,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Validate and write a blob, returning its reference.
    pub fn store(
        &self,
        kind: BlobKind,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<BlobRef, BlobError> {
        self.check(kind, content_type, bytes.len())?;

        let name = format!(
            "{}-{}{}",
            kind,
            Uuid::new_v4(),
            file_name.map(extension).unwrap_or_default()
        );
        let blob = BlobRef::new(kind, &name)?;
        let path = self.dir.join(blob.as_str());
        let tmp = self.dir.join(format!(".{name}.tmp"));

        let io = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| BlobError::Io { path, source }
        };
        let written = (|| {
            let mut f = fs::File::create(&tmp).map_err(io(&tmp))?;
            f.write_all(bytes).map_err(io(&tmp))?;
            f.sync_all().map_err(io(&tmp))?;
            fs::rename(&tmp, &path).map_err(io(&path))
        })();
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written?;

        tracing::debug!(blob = %blob, bytes = bytes.len(), "blob stored");
        Ok(blob)
    }

    /// Whether a blob with this reference is present.
    pub fn exists(&self, blob: &BlobRef) -> bool {
        self.dir.join(blob.as_str()).is_file()
    }

    /// Best-effort removal of a blob that will not be referenced.
    pub fn remove(&self, blob: &BlobRef) {
        if let Err(e) = fs::remove_file(self.dir.join(blob.as_str())) {
            tracing::warn!(blob = %blob, error = %e, "failed to remove orphaned blob");
        }
    }
}

/// `.ext` from a client file name, or empty if absent or unusable.
fn extension(file_name: &str) -> String {
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext)
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

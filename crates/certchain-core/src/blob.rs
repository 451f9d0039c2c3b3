//! # Blob References
//!
//! Certificate PDFs and student photos live in an external blob store. The
//! core only ever holds an opaque [`BlobRef`] naming the stored file; it never
//! reads or writes blob bytes.
//!
//! References double as file names in the blob directory and as path
//! segments in download URLs, so the constructor rejects anything that could
//! escape that directory.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on reference length (common filesystem name limit).
const MAX_REF_LEN: usize = 255;

/// The two blob slots a certificate carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobKind {
    /// The certificate document (`application/pdf`).
    Pdf,
    /// The student photo (`image/*`).
    Photo,
}

impl BlobKind {
    /// Returns the wire name, also used as the multipart field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Photo => "photo",
        }
    }
}

impl std::fmt::Display for BlobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque, validated reference to a stored blob.
///
/// # Invariants
///
/// - Non-empty after trimming; stored trimmed.
/// - At most 255 bytes.
/// - No `/`, `\` or NUL, and not `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    /// Validate a reference for the given blob slot.
    pub fn new(kind: BlobKind, value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        let invalid = |reason: &str| ValidationError::InvalidBlobRef {
            kind,
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(ValidationError::MissingBlobRef { kinds: vec![kind] });
        }
        if trimmed.len() > MAX_REF_LEN {
            return Err(invalid("reference exceeds 255 bytes"));
        }
        if trimmed.contains(['/', '\\', '\0']) {
            return Err(invalid("path separators are not allowed"));
        }
        if trimmed == "." || trimmed == ".." {
            return Err(invalid("relative path components are not allowed"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlobRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_generated_file_names() {
        let r = BlobRef::new(BlobKind::Pdf, "pdf-1700000000000-123456.pdf").unwrap();
        assert_eq!(r.as_str(), "pdf-1700000000000-123456.pdf");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let r = BlobRef::new(BlobKind::Photo, "  photo-1  ").unwrap();
        assert_eq!(r.as_str(), "photo-1");
    }

    #[test]
    fn blank_is_missing() {
        let err = BlobRef::new(BlobKind::Photo, "   ").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingBlobRef {
                kinds: vec![BlobKind::Photo]
            }
        );
    }

    #[test]
    fn rejects_path_traversal() {
        for bad in ["../secret", "a/b", "a\\b", ".", ".."] {
            let err = BlobRef::new(BlobKind::Pdf, bad).unwrap_err();
            assert_eq!(err.kind(), "invalid_blob_ref", "input {bad:?}");
        }
    }

    #[test]
    fn rejects_overlong_reference() {
        let long = "x".repeat(MAX_REF_LEN + 1);
        assert!(BlobRef::new(BlobKind::Pdf, &long).is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let r = BlobRef::new(BlobKind::Pdf, "pdf-1").unwrap();
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"pdf-1\"");
    }

    #[test]
    fn blob_kind_wire_names() {
        assert_eq!(BlobKind::Pdf.to_string(), "pdf");
        assert_eq!(
            serde_json::to_string(&BlobKind::Photo).unwrap(),
            "\"photo\""
        );
    }
}

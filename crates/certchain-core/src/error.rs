//! # Validation Errors
//!
//! Structured validation failures for CertChain domain types, built with
//! `thiserror`. Each variant carries the offending input so that callers can
//! report exactly what was rejected.

use thiserror::Error;

use crate::blob::BlobKind;

/// A submission or lookup input that failed validation.
///
/// Validation errors are raised before any store mutation, so a caller that
/// receives one knows nothing was written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required text fields are absent or blank after trimming.
    #[error("missing required fields: {}", .fields.join(", "))]
    MissingField {
        /// Wire names of every missing field, in canonical field order.
        fields: Vec<&'static str>,
    },

    /// One or both blob references are absent or blank.
    #[error("missing blob references: {}", display_kinds(.kinds))]
    MissingBlobRef {
        /// The blob kinds that were not supplied.
        kinds: Vec<BlobKind>,
    },

    /// A blob reference is present but unusable.
    #[error("invalid {kind} reference \"{value}\": {reason}")]
    InvalidBlobRef {
        /// Which blob the reference points to.
        kind: BlobKind,
        /// The rejected reference.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A content hash string is not 64 hex characters.
    #[error("invalid content hash \"{value}\": {reason}")]
    InvalidContentHash {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Timestamp string is not valid RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ValidationError {
    /// Machine-readable kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::MissingBlobRef { .. } => "missing_blob_ref",
            Self::InvalidBlobRef { .. } => "invalid_blob_ref",
            Self::InvalidContentHash { .. } => "invalid_hash",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
        }
    }
}

fn display_kinds(kinds: &[BlobKind]) -> String {
    kinds
        .iter()
        .map(BlobKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_lists_every_field() {
        let err = ValidationError::MissingField {
            fields: vec!["name", "instituteName"],
        };
        assert_eq!(
            err.to_string(),
            "missing required fields: name, instituteName"
        );
        assert_eq!(err.kind(), "missing_field");
    }

    #[test]
    fn missing_blob_ref_lists_kinds() {
        let err = ValidationError::MissingBlobRef {
            kinds: vec![BlobKind::Pdf, BlobKind::Photo],
        };
        assert_eq!(err.to_string(), "missing blob references: pdf, photo");
        assert_eq!(err.kind(), "missing_blob_ref");
    }

    #[test]
    fn invalid_blob_ref_display() {
        let err = ValidationError::InvalidBlobRef {
            kind: BlobKind::Photo,
            value: "../etc".to_string(),
            reason: "path separators are not allowed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("photo"));
        assert!(msg.contains("../etc"));
        assert_eq!(err.kind(), "invalid_blob_ref");
    }

    #[test]
    fn invalid_hash_and_timestamp_kinds() {
        let hash = ValidationError::InvalidContentHash {
            value: "xyz".to_string(),
            reason: "bad".to_string(),
        };
        let ts = ValidationError::InvalidTimestamp {
            value: "yesterday".to_string(),
            reason: "bad".to_string(),
        };
        assert_eq!(hash.kind(), "invalid_hash");
        assert_eq!(ts.kind(), "invalid_timestamp");
        assert!(ts.to_string().contains("yesterday"));
    }
}

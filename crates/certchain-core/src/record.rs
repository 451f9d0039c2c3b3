//! # Certificate Records
//!
//! A [`Record`] is the metadata of one issued certificate: three descriptive
//! text fields, two blob references and the creation timestamp. Records are
//! immutable once issued; the only constructor is [`Record::issue()`], which
//! takes already-validated parts.
//!
//! Raw submissions arrive as [`RecordFields`] (every field optional, as on
//! the wire) and become a [`CertificateText`] through
//! [`RecordFields::validate()`].

use serde::{Deserialize, Serialize};

use crate::blob::{BlobKind, BlobRef};
use crate::canonical::{CanonicalBytes, HashScheme};
use crate::digest::{sha256_digest, ContentHash};
use crate::error::ValidationError;
use crate::temporal::Timestamp;

/// Raw text fields of a submission, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub institute_name: Option<String>,
}

impl RecordFields {
    /// Trim every field and check that none is blank.
    ///
    /// Reports all missing fields at once, in canonical order.
    pub fn validate(&self) -> Result<CertificateText, ValidationError> {
        let name = trimmed(&self.name);
        let course_name = trimmed(&self.course_name);
        let institute_name = trimmed(&self.institute_name);

        match (name, course_name, institute_name) {
            (Some(name), Some(course_name), Some(institute_name)) => Ok(CertificateText {
                name,
                course_name,
                institute_name,
            }),
            (name, course_name, institute_name) => {
                let fields = [
                    ("name", name.is_none()),
                    ("courseName", course_name.is_none()),
                    ("instituteName", institute_name.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, missing)| missing.then_some(field))
                .collect();
                Err(ValidationError::MissingField { fields })
            }
        }
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validated, trimmed certificate text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateText {
    name: String,
    course_name: String,
    institute_name: String,
}

impl CertificateText {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    pub fn institute_name(&self) -> &str {
        &self.institute_name
    }
}

/// One issued certificate's metadata.
///
/// Deserialization re-runs validation, so a hand-edited snapshot cannot
/// smuggle in a blank field or a traversal path. The legacy field names
/// `pdfFilename` and `photoFilename` are accepted on input. `hashScheme` is
/// only written for records that do not use the v1 encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRecord")]
pub struct Record {
    name: String,
    course_name: String,
    institute_name: String,
    pdf_ref: BlobRef,
    photo_ref: BlobRef,
    created_at: Timestamp,
    #[serde(skip_serializing_if = "HashScheme::is_v1")]
    hash_scheme: HashScheme,
}

impl Record {
    /// Assemble a record from validated parts.
    pub fn issue(
        text: CertificateText,
        pdf_ref: BlobRef,
        photo_ref: BlobRef,
        created_at: Timestamp,
    ) -> Self {
        Self {
            name: text.name,
            course_name: text.course_name,
            institute_name: text.institute_name,
            pdf_ref,
            photo_ref,
            created_at,
            hash_scheme: HashScheme::V1,
        }
    }

    /// Re-tag the encoding this record's hash was computed over.
    pub fn with_hash_scheme(mut self, scheme: HashScheme) -> Self {
        self.hash_scheme = scheme;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    pub fn institute_name(&self) -> &str {
        &self.institute_name
    }

    pub fn pdf_ref(&self) -> &BlobRef {
        &self.pdf_ref
    }

    pub fn photo_ref(&self) -> &BlobRef {
        &self.photo_ref
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn hash_scheme(&self) -> HashScheme {
        self.hash_scheme
    }

    /// Canonical encoding of this record under its hash scheme.
    pub fn canonical_bytes(&self) -> CanonicalBytes {
        CanonicalBytes::new(self)
    }

    /// SHA-256 of the canonical encoding.
    pub fn content_hash(&self) -> ContentHash {
        sha256_digest(&self.canonical_bytes())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    name: Option<String>,
    course_name: Option<String>,
    institute_name: Option<String>,
    #[serde(alias = "pdfFilename")]
    pdf_ref: Option<String>,
    #[serde(alias = "photoFilename")]
    photo_ref: Option<String>,
    created_at: Timestamp,
    #[serde(default)]
    hash_scheme: HashScheme,
}

impl TryFrom<RawRecord> for Record {
    type Error = ValidationError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let text = RecordFields {
            name: raw.name,
            course_name: raw.course_name,
            institute_name: raw.institute_name,
        }
        .validate()?;
        let pdf_ref = BlobRef::new(BlobKind::Pdf, raw.pdf_ref.as_deref().unwrap_or_default())?;
        let photo_ref = BlobRef::new(
            BlobKind::Photo,
            raw.photo_ref.as_deref().unwrap_or_default(),
        )?;
        Ok(Record::issue(text, pdf_ref, photo_ref, raw.created_at).with_hash_scheme(raw.hash_scheme))
    }
}

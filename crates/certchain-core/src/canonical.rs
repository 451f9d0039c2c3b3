//! # Canonical Record Encoding
//!
//! This module defines [`CanonicalBytes`], the sole construction path for bytes
//! used in content-hash computation.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only way to construct `CanonicalBytes` is
//! through [`CanonicalBytes::new()`], which writes the fixed layout named by
//! the record's [`HashScheme`]: v1 below for everything issued here.
//! Hashing generic serializer output (whose field order and escaping are not
//! contractual) is therefore impossible.
//!
//! ## Layout (v1)
//!
//! ```text
//! DOMAIN   = "certchain.record.v1" 0x00
//! FIELD(t) = tag:u8 || len:u64 big-endian || utf8 bytes
//! BYTES    = DOMAIN
//!         || FIELD(0x01, name)
//!         || FIELD(0x02, courseName)
//!         || FIELD(0x03, instituteName)
//!         || FIELD(0x04, pdfRef)
//!         || FIELD(0x05, photoRef)
//!         || FIELD(0x06, createdAt)
//! ```
//!
//! Every field is length-prefixed, so no two distinct records share an
//! encoding: `name="ab", courseName="c"` and `name="a", courseName="bc"`
//! differ in their length bytes. Changing this layout changes every hash
//! already committed on-chain; add a new domain tag instead.
//!
//! ## Legacy JSON
//!
//! Records imported from a pre-versioned snapshot were hashed as the compact
//! JSON text of the object below, keys in exactly this order. They carry
//! [`HashScheme::LegacyJson`] so that their committed hashes still verify.
//!
//! ```text
//! {"name":..,"courseName":..,"instituteName":..,"pdfFilename":..,"photoFilename":..,"createdAt":..}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;

/// Which encoding a record's content hash was computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashScheme {
    /// Domain-separated, length-prefixed fields.
    #[default]
    V1,
    /// Compact JSON text, as written by the pre-versioned backend.
    LegacyJson,
}

impl HashScheme {
    pub fn is_v1(&self) -> bool {
        matches!(self, HashScheme::V1)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashScheme::V1 => "v1",
            HashScheme::LegacyJson => "legacy-json",
        }
    }
}

/// Domain separator prefixed to every encoding.
pub const DOMAIN_SEPARATOR: &[u8] = b"certchain.record.v1\0";

const TAG_NAME: u8 = 0x01;
const TAG_COURSE_NAME: u8 = 0x02;
const TAG_INSTITUTE_NAME: u8 = 0x03;
const TAG_PDF_REF: u8 = 0x04;
const TAG_PHOTO_REF: u8 = 0x05;
const TAG_CREATED_AT: u8 = 0x06;

/// Bytes produced exclusively by a record encoding.
///
/// The inner `Vec<u8>` is private; downstream code cannot construct
/// `CanonicalBytes` except through [`CanonicalBytes::new()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Encode a record under its own hash scheme. Pure and infallible: every
    /// `Record` is already validated, and neither layout has failure modes.
    pub fn new(record: &Record) -> Self {
        match record.hash_scheme() {
            HashScheme::V1 => Self::v1(record),
            HashScheme::LegacyJson => Self::legacy_json(record),
        }
    }

    fn v1(record: &Record) -> Self {
        let created_at = record.created_at().to_canonical_string();
        let fields: [(u8, &str); 6] = [
            (TAG_NAME, record.name()),
            (TAG_COURSE_NAME, record.course_name()),
            (TAG_INSTITUTE_NAME, record.institute_name()),
            (TAG_PDF_REF, record.pdf_ref().as_str()),
            (TAG_PHOTO_REF, record.photo_ref().as_str()),
            (TAG_CREATED_AT, &created_at),
        ];

        let capacity = DOMAIN_SEPARATOR.len()
            + fields.iter().map(|(_, v)| 9 + v.len()).sum::<usize>();
        let mut buf = Vec::with_capacity(capacity);
        buf.extend_from_slice(DOMAIN_SEPARATOR);
        for (tag, value) in fields {
            write_field(&mut buf, tag, value);
        }
        Self(buf)
    }

    fn legacy_json(record: &Record) -> Self {
        let created_at = record.created_at().to_canonical_string();
        let fields: [(&str, &str); 6] = [
            ("name", record.name()),
            ("courseName", record.course_name()),
            ("instituteName", record.institute_name()),
            ("pdfFilename", record.pdf_ref().as_str()),
            ("photoFilename", record.photo_ref().as_str()),
            ("createdAt", &created_at),
        ];

        let mut text = String::from("{");
        for (i, (key, value)) in fields.into_iter().enumerate() {
            if i > 0 {
                text.push(',');
            }
            text.push_str(&json_string(key));
            text.push(':');
            text.push_str(&json_string(value));
        }
        text.push('}');
        Self(text.into_bytes())
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Quoted, escaped JSON string literal.
fn json_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn write_field(buf: &mut Vec<u8>, tag: u8, value: &str) {
    buf.push(tag);
    buf.extend_from_slice(&(value.len() as u64).to_be_bytes());
    buf.extend_from_slice(value.as_bytes());
}

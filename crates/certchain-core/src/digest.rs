//! # Content Hashes
//!
//! Defines [`ContentHash`], the SHA-256 digest of a record's canonical
//! encoding. Rendered as 64 lowercase hex characters; this is the value a
//! front-end commits on-chain and later presents for lookup.
//!
//! ## Security Invariant
//!
//! A `ContentHash` can only be *computed* from
//! [`CanonicalBytes`][crate::CanonicalBytes] via [`sha256_digest()`]. Parsing
//! an existing hex string yields a lookup key, never a claim about content.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::ValidationError;

/// A 32-byte SHA-256 content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string. Upper- and lowercase digits are both
    /// accepted; surrounding whitespace is not.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidContentHash {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        if s.len() != 64 {
            return Err(invalid("expected 64 hex characters"));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("non-hex character"));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| invalid("non-hex character"))?;
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        self.0[..6].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for ContentHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Compute the SHA-256 content hash of canonical bytes.
///
/// Accepts only `&CanonicalBytes`; raw byte slices cannot be hashed here.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    ContentHash(hasher.finalize().into())
}

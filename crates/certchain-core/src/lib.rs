//! # certchain-core: Foundational Types for CertChain
//!
//! This crate defines the pure types shared by every other CertChain crate:
//! the certificate [`Record`], its blob references, the UTC [`Timestamp`],
//! the [`CanonicalBytes`] encoding and the SHA-256 [`ContentHash`] that is
//! committed on-chain. It performs no I/O.
//!
//! ## Key Design Principles
//!
//! 1. **Validated newtypes.** `BlobRef` and `ContentHash` can only be built
//!    through checking constructors. No bare strings cross a crate boundary.
//!
//! 2. **`CanonicalBytes` newtype.** Every hash flows through
//!    `CanonicalBytes::new()`, which writes a fixed, length-prefixed field
//!    layout. No generic serializer output is ever hashed. Records imported
//!    from the pre-versioned store keep their legacy JSON scheme.
//!
//! 3. **`sha256_digest()` accepts only `&CanonicalBytes`.** Hashing raw bytes
//!    is a compile error, so the canonical layout cannot be bypassed.
//!
//! 4. **Millisecond UTC timestamps.** `Timestamp` truncates at construction so
//!    that a persisted and reloaded record re-hashes to the same value.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `certchain-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod blob;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod record;
pub mod temporal;

pub use blob::{BlobKind, BlobRef};
pub use canonical::{CanonicalBytes, HashScheme};
pub use digest::{sha256_digest, ContentHash};
pub use error::ValidationError;
pub use record::{CertificateText, Record, RecordFields};
pub use temporal::Timestamp;

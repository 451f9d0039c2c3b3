//! # certchain-registry: Record Service
//!
//! The submission and resolution boundary of CertChain. [`RecordService`]
//! validates raw submissions, assigns `createdAt`, computes the content hash
//! through the canonical encoding, commits the record to a
//! [`RecordStore`](certchain_store::RecordStore) under a bounded write time,
//! and resolves hashes back to records with blob download locators.
//!
//! The service never retains records; the store is the only owner of the
//! mapping.

pub mod error;
pub mod locator;
pub mod service;

pub use error::SubmitError;
pub use locator::{LocatorTemplate, DEFAULT_PUBLIC_BASE};
pub use service::{
    AuditReport, HashMismatch, RecordService, ResolvedRecord, Verification,
    DEFAULT_WRITE_TIMEOUT,
};

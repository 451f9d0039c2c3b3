//! # Record Service
//!
//! Control flow for a submission:
//!
//! ```text
//! raw fields + blob refs
//!   -> validate blob refs (missing_blob_ref, invalid_blob_ref)
//!   -> validate text      (missing_field, every field listed)
//!   -> Record { createdAt = now }
//!   -> CanonicalBytes -> SHA-256 -> ContentHash
//!   -> store.put(hash, record) on a blocking thread, bounded by a timeout
//!   -> hash
//! ```
//!
//! A hash is returned only after the store reported a durable write.
//! Validation failures never reach the store.

use std::sync::Arc;
use std::time::Duration;

use certchain_core::{
    BlobKind, BlobRef, ContentHash, Record, RecordFields, Timestamp, ValidationError,
};
use certchain_store::{RecordStore, StorageWriteError, WriteTicket};
use serde::Serialize;

use crate::error::SubmitError;
use crate::locator::LocatorTemplate;

/// Upper bound on a single `put` unless configured otherwise.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// A stored record with its key and blob download locators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRecord {
    pub hash: ContentHash,
    #[serde(flatten)]
    pub record: Record,
    pub pdf_url: String,
    pub photo_url: String,
}

/// Outcome of re-hashing a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The stored record still hashes to its key.
    Intact,
    /// The stored record hashes to something else.
    Mismatch { recomputed: ContentHash },
    NotFound,
}

/// A stored entry whose record no longer hashes to its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashMismatch {
    pub hash: ContentHash,
    pub recomputed: ContentHash,
}

/// Result of verifying every entry in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub checked: usize,
    pub mismatches: Vec<HashMismatch>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Validates, hashes, commits and resolves certificate records.
#[derive(Debug, Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    locators: LocatorTemplate,
    write_timeout: Duration,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            locators: LocatorTemplate::default(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_locators(mut self, locators: LocatorTemplate) -> Self {
        self.locators = locators;
        self
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn locators(&self) -> &LocatorTemplate {
        &self.locators
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Validate a submission and build its record, stamped with the current
    /// time. Touches nothing.
    pub fn prepare(
        &self,
        fields: &RecordFields,
        pdf_ref: Option<&str>,
        photo_ref: Option<&str>,
    ) -> Result<Record, ValidationError> {
        let (pdf_ref, photo_ref) = validate_blob_refs(pdf_ref, photo_ref)?;
        let text = fields.validate()?;
        Ok(Record::issue(text, pdf_ref, photo_ref, Timestamp::now()))
    }

    /// Validate, hash and durably store a submission.
    pub async fn submit(
        &self,
        fields: &RecordFields,
        pdf_ref: Option<&str>,
        photo_ref: Option<&str>,
    ) -> Result<ContentHash, SubmitError> {
        let record = self.prepare(fields, pdf_ref, photo_ref).map_err(|e| {
            tracing::debug!(kind = e.kind(), error = %e, "submission rejected");
            e
        })?;
        Ok(self.commit(record).await?)
    }

    /// Hash and durably store an already-built record.
    ///
    /// The blocking write runs on tokio's blocking pool under a
    /// [`WriteTicket`]. When the write timeout expires the ticket is
    /// abandoned and the caller gets [`StorageWriteError::Timeout`]; the
    /// store will not make the entry visible afterwards. If the store had
    /// already claimed the ticket, the write is past its point of no return
    /// and its real outcome is awaited instead.
    pub async fn commit(&self, record: Record) -> Result<ContentHash, StorageWriteError> {
        let hash = record.content_hash();
        let name = record.name().to_string();
        let store = Arc::clone(&self.store);
        let ticket = WriteTicket::new();
        let writer_ticket = ticket.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            store.put_with_ticket(hash, record, &writer_ticket)
        });

        let result = match tokio::time::timeout(self.write_timeout, &mut task).await {
            Ok(joined) => flatten_join(joined),
            Err(_) if ticket.abandon() => Err(StorageWriteError::Timeout(self.write_timeout)),
            Err(_) => {
                tracing::warn!(hash = %hash.short(), "write timeout expired after commit point; awaiting outcome");
                flatten_join(task.await)
            }
        };

        match result {
            Ok(()) => {
                tracing::info!(hash = %hash.short(), name = %name, "certificate stored");
                Ok(hash)
            }
            Err(e) => {
                tracing::error!(hash = %hash.short(), kind = e.kind(), error = %e, "storage write failed");
                Err(e)
            }
        }
    }

    /// Look up a record by hash.
    pub fn resolve(&self, hash: &ContentHash) -> Option<ResolvedRecord> {
        let record = self.store.get(hash)?;
        Some(ResolvedRecord {
            hash: *hash,
            pdf_url: self.locators.locate(record.pdf_ref()),
            photo_url: self.locators.locate(record.photo_ref()),
            record,
        })
    }

    /// Parse a hex hash and look it up. Malformed input is an error, not a
    /// miss.
    pub fn resolve_str(&self, hash: &str) -> Result<Option<ResolvedRecord>, ValidationError> {
        let hash = ContentHash::parse(hash)?;
        Ok(self.resolve(&hash))
    }

    /// Recompute the hash of a stored record and compare it to its key.
    pub fn verify(&self, hash: &ContentHash) -> Verification {
        match self.store.get(hash) {
            None => Verification::NotFound,
            Some(record) => {
                let recomputed = record.content_hash();
                if recomputed == *hash {
                    Verification::Intact
                } else {
                    Verification::Mismatch { recomputed }
                }
            }
        }
    }

    /// Verify every stored entry, in insertion order.
    pub fn audit(&self) -> AuditReport {
        let mut report = AuditReport::default();
        for hash in self.store.hashes() {
            report.checked += 1;
            if let Verification::Mismatch { recomputed } = self.verify(&hash) {
                tracing::warn!(hash = %hash.short(), recomputed = %recomputed.short(), "hash mismatch");
                report.mismatches.push(HashMismatch { hash, recomputed });
            }
        }
        report
    }
}

fn flatten_join(
    joined: Result<Result<(), StorageWriteError>, tokio::task::JoinError>,
) -> Result<(), StorageWriteError> {
    joined.unwrap_or_else(|join| Err(StorageWriteError::Interrupted(join.to_string())))
}

/// Both refs must be present; if either is missing, all missing kinds are
/// reported together.
fn validate_blob_refs(
    pdf_ref: Option<&str>,
    photo_ref: Option<&str>,
) -> Result<(BlobRef, BlobRef), ValidationError> {
    let blank = |v: Option<&str>| v.map_or(true, |s| s.trim().is_empty());
    let missing: Vec<BlobKind> = [(BlobKind::Pdf, pdf_ref), (BlobKind::Photo, photo_ref)]
        .into_iter()
        .filter(|(_, v)| blank(*v))
        .map(|(kind, _)| kind)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingBlobRef { kinds: missing });
    }
    Ok((
        BlobRef::new(BlobKind::Pdf, pdf_ref.unwrap_or_default())?,
        BlobRef::new(BlobKind::Photo, photo_ref.unwrap_or_default())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use certchain_store::{FileStore, MemoryStore};

    fn alice() -> RecordFields {
        RecordFields {
            name: Some("Alice Tan".into()),
            course_name: Some("Data Structures".into()),
            institute_name: Some("Tech U".into()),
        }
    }

    fn service() -> RecordService {
        RecordService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn scenario_submit_resolve_and_miss() {
        let svc = service();
        let hash = svc
            .submit(&alice(), Some("pdf-1"), Some("photo-1"))
            .await
            .unwrap();
        assert_eq!(hash.to_hex().len(), 64);

        let resolved = svc.resolve(&hash).unwrap();
        assert_eq!(resolved.hash, hash);
        assert_eq!(resolved.record.name(), "Alice Tan");
        assert_eq!(resolved.record.course_name(), "Data Structures");
        assert_eq!(resolved.record.institute_name(), "Tech U");
        assert_eq!(resolved.record.pdf_ref().as_str(), "pdf-1");
        assert_eq!(resolved.record.photo_ref().as_str(), "photo-1");
        assert_eq!(resolved.pdf_url, "/uploads/pdf-1");
        assert_eq!(resolved.photo_url, "/uploads/photo-1");
        assert_eq!(resolved.record.content_hash(), hash);

        let zero = "0".repeat(64);
        assert_eq!(svc.resolve_str(&zero).unwrap(), None);
    }

    #[tokio::test]
    async fn whitespace_name_is_rejected_without_store_change() {
        let svc = service();
        let mut fields = alice();
        fields.name = Some("   ".into());
        let err = svc
            .submit(&fields, Some("pdf-1"), Some("photo-1"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "validation");
        assert_eq!(err.kind(), "missing_field");
        assert!(svc.is_empty());
    }

    #[tokio::test]
    async fn blob_refs_are_checked_before_text() {
        let svc = service();
        let err = svc
            .submit(&RecordFields::default(), None, Some("  "))
            .await
            .unwrap_err();
        match err {
            SubmitError::Validation(ValidationError::MissingBlobRef { kinds }) => {
                assert_eq!(kinds, vec![BlobKind::Pdf, BlobKind::Photo]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(svc.is_empty());
    }

    #[tokio::test]
    async fn traversal_ref_is_invalid() {
        let svc = service();
        let err = svc
            .submit(&alice(), Some("../etc/passwd"), Some("photo-1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_blob_ref");
        assert!(svc.is_empty());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_miss() {
        let err = service().resolve_str("not-a-hash").unwrap_err();
        assert_eq!(err.kind(), "invalid_hash");
    }

    #[tokio::test]
    async fn resubmission_gets_distinct_hash() {
        let svc = service();
        let a = svc.submit(&alice(), Some("p"), Some("q")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        let b = svc.submit(&alice(), Some("p"), Some("q")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(svc.len(), 2);
    }

    #[tokio::test]
    async fn records_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        let hash = {
            let svc = RecordService::new(Arc::new(FileStore::open(&path).unwrap()));
            svc.submit(&alice(), Some("pdf-1"), Some("photo-1"))
                .await
                .unwrap()
        };
        let svc = RecordService::new(Arc::new(FileStore::open(&path).unwrap()));
        let resolved = svc.resolve(&hash).unwrap();
        assert_eq!(resolved.record.name(), "Alice Tan");
        assert_eq!(svc.verify(&hash), Verification::Intact);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submits_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let svc = RecordService::new(Arc::new(
            FileStore::open(dir.path().join("db.json")).unwrap(),
        ));
        let n = 24;
        let tasks: Vec<_> = (0..n)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    let fields = RecordFields {
                        name: Some(format!("Student {i}")),
                        course_name: Some(format!("Course {i}")),
                        institute_name: Some("Tech U".into()),
                    };
                    let pdf = format!("pdf-{i}");
                    let photo = format!("photo-{i}");
                    let hash = svc.submit(&fields, Some(pdf.as_str()), Some(photo.as_str())).await.unwrap();
                    (i, hash)
                })
            })
            .collect();

        let mut hashes = Vec::new();
        for task in tasks {
            hashes.push(task.await.unwrap());
        }

        let distinct: std::collections::HashSet<_> = hashes.iter().map(|(_, h)| *h).collect();
        assert_eq!(distinct.len(), n);
        assert_eq!(svc.len(), n);
        for (i, hash) in hashes {
            let resolved = svc.resolve(&hash).unwrap();
            assert_eq!(resolved.record.name(), format!("Student {i}"));
            assert_eq!(resolved.record.course_name(), format!("Course {i}"));
            assert_eq!(resolved.record.pdf_ref().as_str(), format!("pdf-{i}"));
        }
    }

    #[derive(Debug)]
    struct SlowStore(Duration);

    impl RecordStore for SlowStore {
        fn put_with_ticket(
            &self,
            _: ContentHash,
            _: Record,
            _: &WriteTicket,
        ) -> Result<(), StorageWriteError> {
            std::thread::sleep(self.0);
            Ok(())
        }
        fn get(&self, _: &ContentHash) -> Option<Record> {
            None
        }
        fn len(&self) -> usize {
            0
        }
        fn hashes(&self) -> Vec<ContentHash> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn slow_write_times_out() {
        let svc = RecordService::new(Arc::new(SlowStore(Duration::from_millis(500))))
            .with_write_timeout(Duration::from_millis(20));
        let err = svc
            .submit(&alice(), Some("p"), Some("q"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Storage(StorageWriteError::Timeout(_))
        ));
        assert_eq!(err.kind(), "io_failure");
    }

    const LEGACY_HASH: &str = "e2068345db7b680c2c91e11a4f50f80318eee4aaaf875a9cbfaa2d513c4cf66b";

    fn write_legacy_snapshot(path: &std::path::Path) {
        let json = format!(
            r#"{{
  "{LEGACY_HASH}": {{
    "name": "Alice Tan",
    "courseName": "Data Structures",
    "instituteName": "Tech U",
    "pdfFilename": "pdf-1700000000000-1.pdf",
    "photoFilename": "photo-1700000000000-2.png",
    "createdAt": "2023-11-14T22:13:20.000Z"
  }}
}}"#
        );
        std::fs::write(path, json).unwrap();
    }

    #[tokio::test]
    async fn imported_legacy_records_verify_before_and_after_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        write_legacy_snapshot(&path);
        let legacy = ContentHash::parse(LEGACY_HASH).unwrap();

        let svc = RecordService::new(Arc::new(FileStore::open(&path).unwrap()));
        assert_eq!(svc.verify(&legacy), Verification::Intact);
        assert!(svc.audit().is_clean());

        // Forces the snapshot to be rewritten in the versioned layout.
        let fresh = svc.submit(&alice(), Some("p"), Some("q")).await.unwrap();

        let reopened = RecordService::new(Arc::new(FileStore::open(&path).unwrap()));
        assert_eq!(reopened.verify(&legacy), Verification::Intact);
        assert_eq!(reopened.verify(&fresh), Verification::Intact);
        let report = reopened.audit();
        assert_eq!(report.checked, 2);
        assert!(report.is_clean());
    }

    /// Sleeps before handing the write to another store.
    #[derive(Debug)]
    struct DelayedStore {
        delay: Duration,
        inner: Arc<dyn RecordStore>,
    }

    impl RecordStore for DelayedStore {
        fn put_with_ticket(
            &self,
            hash: ContentHash,
            record: Record,
            ticket: &WriteTicket,
        ) -> Result<(), StorageWriteError> {
            std::thread::sleep(self.delay);
            self.inner.put_with_ticket(hash, record, ticket)
        }
        fn get(&self, hash: &ContentHash) -> Option<Record> {
            self.inner.get(hash)
        }
        fn len(&self) -> usize {
            self.inner.len()
        }
        fn hashes(&self) -> Vec<ContentHash> {
            self.inner.hashes()
        }
    }

    fn delayed(inner: Arc<dyn RecordStore>) -> RecordService {
        RecordService::new(Arc::new(DelayedStore {
            delay: Duration::from_millis(200),
            inner,
        }))
        .with_write_timeout(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn timed_out_write_never_lands() {
        let inner = Arc::new(MemoryStore::new());
        let svc = delayed(inner.clone());
        let err = svc
            .submit(&alice(), Some("p"), Some("q"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Storage(StorageWriteError::Timeout(_))
        ));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(inner.len(), 0);
        assert!(svc.is_empty());
    }

    #[tokio::test]
    async fn timed_out_file_write_never_lands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let file = Arc::new(FileStore::open(&path).unwrap());
        let svc = delayed(file.clone());
        let err = svc
            .submit(&alice(), Some("p"), Some("q"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "io_failure");

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(file.is_empty());
        assert!(FileStore::open(&path).unwrap().is_empty());
    }

    #[derive(Debug)]
    struct FailingStore;

    impl RecordStore for FailingStore {
        fn put_with_ticket(
            &self,
            _: ContentHash,
            _: Record,
            _: &WriteTicket,
        ) -> Result<(), StorageWriteError> {
            Err(StorageWriteError::Io {
                path: "db.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
        fn get(&self, _: &ContentHash) -> Option<Record> {
            None
        }
        fn len(&self) -> usize {
            0
        }
        fn hashes(&self) -> Vec<ContentHash> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn storage_failure_returns_no_hash() {
        let svc = RecordService::new(Arc::new(FailingStore));
        let err = svc
            .submit(&alice(), Some("p"), Some("q"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "storage");
        assert_eq!(err.kind(), "io_failure");
    }

    #[tokio::test]
    async fn verify_and_audit_detect_mismatch() {
        let svc = service();
        let good = svc.submit(&alice(), Some("p"), Some("q")).await.unwrap();

        let record = svc.prepare(&alice(), Some("x"), Some("y")).unwrap();
        let wrong_key = ContentHash::from_bytes([7; 32]);
        svc.store().put(wrong_key, record.clone()).unwrap();

        assert_eq!(svc.verify(&good), Verification::Intact);
        assert_eq!(
            svc.verify(&wrong_key),
            Verification::Mismatch {
                recomputed: record.content_hash()
            }
        );
        assert_eq!(
            svc.verify(&ContentHash::from_bytes([0; 32])),
            Verification::NotFound
        );

        let report = svc.audit();
        assert_eq!(report.checked, 2);
        assert!(!report.is_clean());
        assert_eq!(report.mismatches[0].hash, wrong_key);
    }

    #[tokio::test]
    async fn resolved_record_json_shape() {
        let svc = service();
        let hash = svc.submit(&alice(), Some("pdf-1"), Some("photo-1")).await.unwrap();
        let value = serde_json::to_value(svc.resolve(&hash).unwrap()).unwrap();
        assert_eq!(value["hash"], hash.to_hex());
        assert_eq!(value["name"], "Alice Tan");
        assert_eq!(value["pdfRef"], "pdf-1");
        assert_eq!(value["pdfUrl"], "/uploads/pdf-1");
        assert_eq!(value["photoUrl"], "/uploads/photo-1");
        assert!(value["createdAt"].is_string());
    }
}

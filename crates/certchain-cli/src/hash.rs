//! # Hash Subcommand
//!
//! Computes the content hash of a record from its fields without opening
//! any store. Useful for checking an on-chain hash against a paper
//! certificate.

use anyhow::Result;
use clap::Args;

use certchain_core::{BlobKind, BlobRef, ContentHash, Record, RecordFields, Timestamp};

/// Arguments for `certchain hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub course: String,
    #[arg(long)]
    pub institute: String,
    #[arg(long)]
    pub pdf_ref: String,
    #[arg(long)]
    pub photo_ref: String,
    /// Issuance time, RFC 3339. Sub-millisecond precision is dropped.
    #[arg(long, value_name = "RFC3339")]
    pub created_at: String,
    /// Also print the canonical byte encoding as hex.
    #[arg(long)]
    pub show_canonical: bool,
}

/// Print the content hash for the given fields.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let record = build_record(args)?;
    if args.show_canonical {
        let hex: String = record
            .canonical_bytes()
            .as_bytes()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        println!("canonical: {hex}");
    }
    println!("{}", record.content_hash());
    Ok(0)
}

/// Compute the content hash for the given fields.
pub fn compute_hash(args: &HashArgs) -> Result<ContentHash> {
    Ok(build_record(args)?.content_hash())
}

fn build_record(args: &HashArgs) -> Result<Record> {
    let text = RecordFields {
        name: Some(args.name.clone()),
        course_name: Some(args.course.clone()),
        institute_name: Some(args.institute.clone()),
    }
    .validate()?;
    Ok(Record::issue(
        text,
        BlobRef::new(BlobKind::Pdf, &args.pdf_ref)?,
        BlobRef::new(BlobKind::Photo, &args.photo_ref)?,
        Timestamp::parse(&args.created_at)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(created_at: &str) -> HashArgs {
        HashArgs {
            name: "Alice Tan".into(),
            course: "Data Structures".into(),
            institute: "Tech U".into(),
            pdf_ref: "pdf-1.pdf".into(),
            photo_ref: "photo-1.png".into(),
            created_at: created_at.into(),
            show_canonical: false,
        }
    }

    #[test]
    fn same_instant_same_hash() {
        let utc = compute_hash(&args("2026-01-15T12:00:00.000Z")).unwrap();
        let offset = compute_hash(&args("2026-01-15T14:00:00+02:00")).unwrap();
        assert_eq!(utc, offset);
    }

    #[test]
    fn different_instant_different_hash() {
        let a = compute_hash(&args("2026-01-15T12:00:00.000Z")).unwrap();
        let b = compute_hash(&args("2026-01-15T12:00:00.001Z")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn matches_the_hash_submit_stored() {
        use crate::records::{open_service, run_submit, StoreOptions, SubmitArgs};

        let dir = tempfile::tempdir().unwrap();
        let opts = StoreOptions {
            db: dir.path().join("database.json"),
            public_base: certchain_registry::DEFAULT_PUBLIC_BASE.to_string(),
            write_timeout_ms: 5000,
        };
        let submitted = SubmitArgs {
            name: " Alice Tan ".into(),
            course: "Data Structures".into(),
            institute: "Tech U".into(),
            pdf_ref: "pdf-1.pdf".into(),
            photo_ref: "photo-1.png".into(),
        };
        assert_eq!(run_submit(&submitted, &opts).unwrap(), 0);

        let service = open_service(&opts).unwrap();
        let stored = service.store().hashes()[0];
        let record = service.store().get(&stored).unwrap();

        let offline = HashArgs {
            name: submitted.name.clone(),
            course: submitted.course.clone(),
            institute: submitted.institute.clone(),
            pdf_ref: submitted.pdf_ref.clone(),
            photo_ref: submitted.photo_ref.clone(),
            created_at: record.created_at().to_canonical_string(),
            show_canonical: false,
        };
        assert_eq!(compute_hash(&offline).unwrap(), stored);
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let err = compute_hash(&args("yesterday")).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn blank_field_is_an_error() {
        let mut a = args("2026-01-15T12:00:00.000Z");
        a.institute = "".into();
        assert!(compute_hash(&a).is_err());
    }
}

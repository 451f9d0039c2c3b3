//! # Record Subcommands
//!
//! Store-backed operations over the snapshot file: submit, resolve,
//! verify, audit and list. Wraps `certchain-registry` so the CLI and the
//! HTTP service hash and persist records identically.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use certchain_core::{ContentHash, RecordFields};
use certchain_registry::{LocatorTemplate, RecordService, Verification, DEFAULT_PUBLIC_BASE};
use certchain_store::FileStore;

/// Where the snapshot lives and how records are presented.
#[derive(Args, Debug, Clone)]
pub struct StoreOptions {
    /// Record snapshot file.
    #[arg(
        long,
        env = "CERTCHAIN_DB_PATH",
        default_value = "data/database.json",
        global = true
    )]
    pub db: PathBuf,

    /// Base for the `pdfUrl`/`photoUrl` locators printed by `resolve`.
    #[arg(long, env = "CERTCHAIN_PUBLIC_BASE", default_value = DEFAULT_PUBLIC_BASE, global = true)]
    pub public_base: String,

    /// Bound on a single record write, in milliseconds.
    #[arg(
        long,
        env = "CERTCHAIN_WRITE_TIMEOUT_MS",
        default_value_t = 5000,
        global = true
    )]
    pub write_timeout_ms: u64,
}

/// Arguments for `certchain submit`.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Student name.
    #[arg(long)]
    pub name: String,
    /// Course name.
    #[arg(long)]
    pub course: String,
    /// Issuing institute.
    #[arg(long)]
    pub institute: String,
    /// Reference of the stored certificate PDF.
    #[arg(long)]
    pub pdf_ref: String,
    /// Reference of the stored photo.
    #[arg(long)]
    pub photo_ref: String,
}

/// Open the snapshot named by `opts` behind a record service, creating an
/// empty one if absent.
pub fn open_service(opts: &StoreOptions) -> Result<RecordService> {
    check_timeout(opts)?;
    let store = FileStore::open(&opts.db)
        .with_context(|| format!("failed to open record store: {}", opts.db.display()))?;
    Ok(service_over(store, opts))
}

/// Open an existing snapshot for the read-only subcommands. Never creates
/// the file or its directory.
pub fn open_existing_service(opts: &StoreOptions) -> Result<RecordService> {
    check_timeout(opts)?;
    let store = FileStore::open_existing(&opts.db)
        .with_context(|| format!("failed to open record store: {}", opts.db.display()))?;
    Ok(service_over(store, opts))
}

fn check_timeout(opts: &StoreOptions) -> Result<()> {
    if opts.write_timeout_ms == 0 {
        bail!("--write-timeout-ms must be greater than zero");
    }
    Ok(())
}

fn service_over(store: FileStore, opts: &StoreOptions) -> RecordService {
    RecordService::new(Arc::new(store))
        .with_locators(LocatorTemplate::new(opts.public_base.clone()))
        .with_write_timeout(Duration::from_millis(opts.write_timeout_ms))
}

/// Validate, hash and store a record; print its hash.
pub fn run_submit(args: &SubmitArgs, opts: &StoreOptions) -> Result<u8> {
    let service = open_service(opts)?;
    let fields = RecordFields {
        name: Some(args.name.clone()),
        course_name: Some(args.course.clone()),
        institute_name: Some(args.institute.clone()),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let hash = runtime
        .block_on(service.submit(
            &fields,
            Some(args.pdf_ref.as_str()),
            Some(args.photo_ref.as_str()),
        ))
        .map_err(|e| anyhow::anyhow!("submit failed ({}): {e}", e.kind()))?;

    println!("{hash}");
    Ok(0)
}

/// Print the record behind `hash` as JSON.
pub fn run_resolve(hash: &str, opts: &StoreOptions) -> Result<u8> {
    let service = open_existing_service(opts)?;
    let hash = parse_hash(hash)?;
    match service.resolve(&hash) {
        Some(resolved) => {
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            Ok(0)
        }
        None => {
            println!("NOT FOUND: certificate {hash}");
            Ok(1)
        }
    }
}

/// Re-hash the record stored under `hash`.
pub fn run_verify(hash: &str, opts: &StoreOptions) -> Result<u8> {
    let service = open_existing_service(opts)?;
    let hash = parse_hash(hash)?;
    match service.verify(&hash) {
        Verification::Intact => {
            println!("OK: certificate integrity verified hash={hash}");
            Ok(0)
        }
        Verification::Mismatch { recomputed } => {
            println!("FAIL: hash mismatch stored={hash} recomputed={recomputed}");
            Ok(1)
        }
        Verification::NotFound => {
            println!("FAIL: certificate not found hash={hash}");
            Ok(1)
        }
    }
}

/// Re-hash every stored record.
pub fn run_audit(opts: &StoreOptions) -> Result<u8> {
    let service = open_existing_service(opts)?;
    let report = service.audit();
    if report.is_clean() {
        println!("OK: {} records verified", report.checked);
        return Ok(0);
    }
    for mismatch in &report.mismatches {
        println!(
            "FAIL: hash mismatch stored={} recomputed={}",
            mismatch.hash, mismatch.recomputed
        );
    }
    println!(
        "FAIL: {} of {} records do not match their hash",
        report.mismatches.len(),
        report.checked
    );
    Ok(1)
}

/// Print `hash  createdAt  name` per record, oldest first.
pub fn run_list(opts: &StoreOptions) -> Result<u8> {
    let service = open_existing_service(opts)?;
    let store = service.store();
    for hash in store.hashes() {
        if let Some(record) = store.get(&hash) {
            println!("{hash}  {}  {}", record.created_at(), record.name());
        }
    }
    tracing::debug!(records = store.len(), "listed records");
    Ok(0)
}

fn parse_hash(hex: &str) -> Result<ContentHash> {
    ContentHash::parse(hex).map_err(|e| anyhow::anyhow!("{e}"))
}

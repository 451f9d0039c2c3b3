//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Everything in it is cheap to clone.

use std::sync::Arc;

use certchain_registry::{LocatorTemplate, RecordService};
use certchain_store::{FileStore, StoreError};
use thiserror::Error;

use crate::blobs::{BlobError, BlobStore};
use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    /// Record submission and resolution.
    pub service: RecordService,
    /// Uploaded PDFs and photos.
    pub blobs: Arc<BlobStore>,
    pub config: Arc<AppConfig>,
}

/// Failure to bring up the persistent stores.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("record store: {0}")]
    Store(#[from] StoreError),
    #[error("blob store: {0}")]
    Blobs(#[from] BlobError),
}

impl AppState {
    pub fn new(service: RecordService, blobs: BlobStore, config: AppConfig) -> Self {
        Self {
            service,
            blobs: Arc::new(blobs),
            config: Arc::new(config),
        }
    }

    /// Open the record snapshot and blob directory named by `config`.
    pub fn open(config: AppConfig) -> Result<Self, BootstrapError> {
        let store = FileStore::open(&config.db_path)?;
        let service = RecordService::new(Arc::new(store))
            .with_locators(LocatorTemplate::new(config.public_base.clone()))
            .with_write_timeout(config.write_timeout);
        let blobs = BlobStore::open(&config.uploads_dir, config.max_upload_bytes)?;
        Ok(Self::new(service, blobs, config))
    }
}

use certchain_core::ValidationError;
use certchain_store::StorageWriteError;
use thiserror::Error;

/// Why a submission produced no hash.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Input rejected before any store access.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The record did not durably land. Do not commit anything on-chain.
    #[error(transparent)]
    Storage(#[from] StorageWriteError),
}

impl SubmitError {
    /// Coarse category: `validation` or `storage`.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
        }
    }

    /// Fine-grained kind, e.g. `missing_field` or `io_failure`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.kind(),
            Self::Storage(e) => e.kind(),
        }
    }
}

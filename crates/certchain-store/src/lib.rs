//! # certchain-store: Content-Addressed Record Store
//!
//! Maps a [`ContentHash`] to the [`Record`] it was computed from. Two
//! implementations share the [`RecordStore`] trait:
//!
//! - [`MemoryStore`]: index only, for tests and dry runs.
//! - [`FileStore`]: the same index, backed by a JSON snapshot file that is
//!   rewritten atomically on every `put`.
//!
//! ## Guarantees
//!
//! - `put` is atomic with respect to readers: a reader sees either the old
//!   mapping or the new one, never a partial entry.
//! - `FileStore::put` returns `Ok` only after the snapshot has been written,
//!   fsynced, renamed into place and the directory fsynced. On failure both
//!   the file and the in-memory index are left as they were.
//! - Entries are never deleted. Re-putting an existing hash overwrites it in
//!   place and keeps its original position in [`RecordStore::hashes()`].
//! - A `put` made under an abandoned [`WriteTicket`] never becomes visible.
//!
//! All operations are synchronous; async callers run `put` on a blocking
//! thread.

use certchain_core::{ContentHash, Record};

pub mod error;
pub mod file;
mod index;
pub mod memory;
mod snapshot;
pub mod ticket;

pub use error::{StorageWriteError, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use ticket::WriteTicket;

/// A durable or in-memory mapping from content hash to record.
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Insert or overwrite the entry for `hash`.
    fn put(&self, hash: ContentHash, record: Record) -> Result<(), StorageWriteError> {
        self.put_with_ticket(hash, record, &WriteTicket::new())
    }

    /// Like [`put`](Self::put), but the entry only becomes visible if
    /// `ticket` can be claimed. Returns [`StorageWriteError::Abandoned`]
    /// otherwise, with nothing written.
    fn put_with_ticket(
        &self,
        hash: ContentHash,
        record: Record,
        ticket: &WriteTicket,
    ) -> Result<(), StorageWriteError>;

    /// Exact-match lookup.
    fn get(&self, hash: &ContentHash) -> Option<Record>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All hashes in first-insertion order.
    fn hashes(&self) -> Vec<ContentHash>;
}

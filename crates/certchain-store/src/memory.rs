//! In-memory [`RecordStore`]. Nothing survives the process.

use certchain_core::{ContentHash, Record};
use parking_lot::RwLock;

use crate::error::StorageWriteError;
use crate::index::Index;
use crate::ticket::WriteTicket;
use crate::RecordStore;

/// A [`RecordStore`] holding only the in-memory index.
///
/// The lock is `parking_lot`, never held across an `.await`, and does not
/// poison.
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: RwLock<Index>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn put_with_ticket(
        &self,
        hash: ContentHash,
        record: Record,
        ticket: &WriteTicket,
    ) -> Result<(), StorageWriteError> {
        let mut index = self.index.write();
        if !ticket.claim() {
            return Err(StorageWriteError::Abandoned);
        }
        index.insert(hash, record);
        Ok(())
    }

    fn get(&self, hash: &ContentHash) -> Option<Record> {
        self.index.read().get(hash).cloned()
    }

    fn len(&self) -> usize {
        self.index.read().len()
    }

    fn hashes(&self) -> Vec<ContentHash> {
        self.index.read().hashes()
    }
}

use std::collections::HashMap;

use certchain_core::{ContentHash, Record};

/// Hash-keyed records plus first-insertion order.
#[derive(Debug, Default, Clone)]
pub(crate) struct Index {
    records: HashMap<ContentHash, Record>,
    order: Vec<ContentHash>,
}

impl Index {
    /// Insert or overwrite. Returns `true` if the hash was new.
    pub(crate) fn insert(&mut self, hash: ContentHash, record: Record) -> bool {
        let is_new = self.records.insert(hash, record).is_none();
        if is_new {
            self.order.push(hash);
        }
        is_new
    }

    pub(crate) fn get(&self, hash: &ContentHash) -> Option<&Record> {
        self.records.get(hash)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn hashes(&self) -> Vec<ContentHash> {
        self.order.clone()
    }

    /// Entries in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ContentHash, &Record)> {
        self.order
            .iter()
            .filter_map(|h| self.records.get(h).map(|r| (h, r)))
    }
}

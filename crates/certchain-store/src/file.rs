//! # File-Backed Record Store
//!
//! [`FileStore`] keeps the full mapping in memory and mirrors it to a single
//! JSON snapshot file. Every `put` rewrites the whole snapshot:
//!
//! 1. serialize the current index plus the new entry,
//! 2. write it to `<file>.tmp` and fsync,
//! 3. claim the write ticket, or discard the temp file if it was abandoned,
//! 4. rename over `<file>`,
//! 5. fsync the parent directory,
//! 6. only then publish the entry to the in-memory index.
//!
//! Writers are serialized by a mutex; readers only take the index read lock
//! and never touch the file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use certchain_core::{ContentHash, Record};
use parking_lot::{Mutex, RwLock};

use crate::error::{StorageWriteError, StoreError};
use crate::index::Index;
use crate::snapshot;
use crate::ticket::WriteTicket;
use crate::RecordStore;

/// A [`RecordStore`] persisted to one JSON snapshot file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    index: RwLock<Index>,
    writer: Mutex<()>,
}

impl FileStore {
    /// Open the snapshot at `path`, creating it (and its parent directories)
    /// if absent.
    ///
    /// An unreadable or malformed file is an error; it is never silently
    /// replaced by an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::load(path.into(), true)
    }

    /// Open an existing snapshot without writing anything.
    ///
    /// A missing file is [`StoreError::Missing`]; no directory or file is
    /// created and a leftover temp file is left alone.
    pub fn open_existing(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::load(path.into(), false)
    }

    fn load(path: PathBuf, create: bool) -> Result<Self, StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        if !create {
            let index = match fs::read(&path) {
                Ok(bytes) => snapshot::decode(&path, &bytes)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StoreError::Missing { path })
                }
                Err(e) => return Err(io_err(e)),
            };
            return Ok(Self::with_index(path, index));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = tmp_path(&path);
        if tmp.exists() {
            tracing::warn!(path = %tmp.display(), "removing leftover snapshot temp file");
            fs::remove_file(&tmp).map_err(io_err)?;
        }

        let index = match fs::read(&path) {
            Ok(bytes) => snapshot::decode(&path, &bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = Index::default();
                let bytes = snapshot::encode(empty.iter()).map_err(StorageWriteError::from)?;
                write_file_atomic_durable(&path, &bytes, &WriteTicket::new())?;
                tracing::info!(path = %path.display(), "created empty record store");
                empty
            }
            Err(e) => return Err(io_err(e)),
        };

        Ok(Self::with_index(path, index))
    }

    fn with_index(path: PathBuf, index: Index) -> Self {
        tracing::info!(
            path = %path.display(),
            records = index.len(),
            "record store opened"
        );
        Self {
            path,
            index: RwLock::new(index),
            writer: Mutex::new(()),
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for FileStore {
    fn put_with_ticket(
        &self,
        hash: ContentHash,
        record: Record,
        ticket: &WriteTicket,
    ) -> Result<(), StorageWriteError> {
        let _writer = self.writer.lock();
        if ticket.is_abandoned() {
            return Err(StorageWriteError::Abandoned);
        }

        // Only writers mutate the index and we hold the writer lock, so the
        // index cannot change between this read and the publish below.
        let bytes = {
            let index = self.index.read();
            let exists = index.get(&hash).is_some();
            let existing = index
                .iter()
                .map(|(h, r)| if *h == hash { (h, &record) } else { (h, r) });
            if exists {
                snapshot::encode(existing)?
            } else {
                snapshot::encode(existing.chain(std::iter::once((&hash, &record))))?
            }
        };

        write_file_atomic_durable(&self.path, &bytes, ticket)?;

        let records = {
            let mut index = self.index.write();
            index.insert(hash, record);
            index.len()
        };
        tracing::debug!(hash = %hash.short(), records, "record persisted");
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

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_file_atomic_durable(
    path: &Path,
    bytes: &[u8],
    ticket: &WriteTicket,
) -> Result<(), StorageWriteError> {
    let tmp = tmp_path(path);
    let result = (|| {
        let mut f = File::create(&tmp).map_err(|e| StorageWriteError::io(&tmp, e))?;
        f.write_all(bytes)
            .map_err(|e| StorageWriteError::io(&tmp, e))?;
        f.sync_all().map_err(|e| StorageWriteError::io(&tmp, e))?;
        if !ticket.claim() {
            return Err(StorageWriteError::Abandoned);
        }
        fs::rename(&tmp, path).map_err(|e| StorageWriteError::io(path, e))
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    sync_directory(parent).map_err(|e| StorageWriteError::io(parent, e))
}

#[cfg(unix)]
fn sync_directory(path: &Path) -> std::io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

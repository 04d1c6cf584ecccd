//! Gateway persisted as a single JSON object on disk.
//!
//! The file is read once when opened. Every write rewrites the whole file
//! through a sibling temporary file and a rename, so a crash mid-write leaves
//! the previous contents intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::warn;

use super::{PersistenceGateway, StorageError};

/// File-backed key-value storage.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. A file that is not a JSON object of
    /// strings is logged and treated as empty; it is overwritten on the next
    /// write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable storage file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PersistenceGateway for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let previous = entries.insert(key.to_owned(), value.to_owned());
        if let Err(e) = self.flush(&entries) {
            // keep memory and disk in agreement
            match previous {
                Some(previous) => entries.insert(key.to_owned(), previous),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush(&entries) {
            entries.insert(key.to_owned(), previous);
            return Err(e);
        }
        Ok(())
    }
}

//! Directory-backed storage that survives process restarts.
//!
//! Each key is stored as `<key>.entry` inside a single directory. Writes go
//! to a temporary file in the same directory which is then renamed over the
//! target, so a crash mid-write never leaves a truncated value behind.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::backend::{BackendError, StorageBackend};

const ENTRY_EXTENSION: &str = "entry";

/// File-per-key storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    quota: Option<u64>,
}

impl FileBackend {
    /// Open (creating if needed) a storage directory with no size limit.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unavailable`] if the directory cannot be
    /// created or is not a directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            BackendError::Unavailable(format!("cannot open {}: {e}", dir.display()))
        })?;

        Ok(Self { dir, quota: None })
    }

    /// Limit the total size of all entries to `bytes`.
    #[must_use]
    pub const fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// The storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, BackendError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(BackendError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.{ENTRY_EXTENSION}")))
    }

    /// Bytes used by every entry except `skip`, counting key and value.
    fn usage_excluding(&self, skip: &Path) -> Result<u64, BackendError> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path == skip || path.extension().is_none_or(|ext| ext != ENTRY_EXTENSION) {
                continue;
            }
            let key_len = path.file_stem().map_or(0, |stem| stem.len() as u64);
            total += key_len + fs::metadata(&path)?.len();
        }
        Ok(total)
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let path = self.entry_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| BackendError::Undecodable(key.to_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.entry_path(key)?;
        let requested = self.usage_excluding(&path)? + (key.len() + value.len()) as u64;

        if let Some(quota) = self.quota.filter(|&quota| requested > quota) {
            return Err(BackendError::QuotaExceeded { requested, quota });
        }

        let write = || -> std::io::Result<()> {
            let mut tmp = NamedTempFile::new_in(&self.dir)?;
            tmp.write_all(value.as_bytes())?;
            tmp.flush()?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        };

        write().map_err(|e| match e.kind() {
            // The device itself is full; no configured limit applies.
            ErrorKind::StorageFull => BackendError::QuotaExceeded {
                requested,
                quota: self.quota.unwrap_or(0),
            },
            _ => BackendError::Io(e),
        })
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

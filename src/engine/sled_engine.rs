//! Sled backend
//!
//! Drives a `sled::Db` stored in one directory. sled takes an exclusive file
//! lock on the directory, so a second opener of the same path fails.

use std::path::{Path, PathBuf};

use crate::config::OpenOptions;
use crate::error::EngineError;

use super::{check_compaction_range, Backend, BackendCursor, KeyRange, RawEntry, ThreadedEngine};

/// Backend over a sled database directory
pub struct SledBackend {
    path: PathBuf,
    db: Option<sled::Db>,
}

impl SledBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            db: None,
        }
    }

    fn db(&self) -> Result<&sled::Db, EngineError> {
        self.db.as_ref().ok_or(EngineError::NotOpen)
    }
}

impl Backend for SledBackend {
    type Cursor = SledCursor;

    fn location(&self) -> &Path {
        &self.path
    }

    fn open(&mut self, options: &OpenOptions) -> Result<(), EngineError> {
        let exists = self.path.exists();
        if !exists && !options.create_if_missing {
            return Err(EngineError::Missing(self.path.clone()));
        }
        if exists && options.error_if_exists {
            return Err(EngineError::AlreadyExists(self.path.clone()));
        }

        let db = sled::Config::new().path(&self.path).open().map_err(|e| match e {
            sled::Error::Io(io) if is_lock_conflict(&io) => EngineError::Locked(self.path.clone()),
            other => EngineError::Sled(other),
        })?;

        tracing::debug!(
            "sled opened at {} (recovered: {})",
            self.path.display(),
            db.was_recovered()
        );
        self.db = Some(db);
        Ok(())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        self.db()?.insert(key, value)?;
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.db()?.get(key)?.map(|value| value.to_vec()))
    }

    fn compact_range(&mut self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<(), EngineError> {
        check_compaction_range(start, end)?;
        // sled cleans segments itself; a flush persists dirty pages so the
        // cleaner can reclaim the space they shadow
        let flushed = self.db()?.flush()?;
        tracing::debug!("sled flushed {} bytes for compaction", flushed);
        Ok(())
    }

    fn close(&mut self) -> Result<(), EngineError> {
        let db = self.db.take().ok_or(EngineError::NotOpen)?;
        db.flush()?;
        Ok(())
    }

    fn cursor(&mut self, range: KeyRange, reverse: bool) -> Result<SledCursor, EngineError> {
        let tree: sled::Tree = (**self.db()?).clone();
        Ok(SledCursor {
            tree,
            window: range.clone(),
            range,
            reverse,
            iter: None,
        })
    }
}

/// sled wraps a failed `try_lock_exclusive` in an `ErrorKind::Other` error
/// whose message mentions the lock
fn is_lock_conflict(error: &std::io::Error) -> bool {
    error.kind() == std::io::ErrorKind::WouldBlock || error.to_string().contains("lock")
}

/// Cursor over a sled tree
///
/// The underlying `sled::Iter` is created lazily so a seek issued before the
/// first step can narrow it.
pub struct SledCursor {
    tree: sled::Tree,
    range: KeyRange,
    window: KeyRange,
    reverse: bool,
    iter: Option<sled::Iter>,
}

impl BackendCursor for SledCursor {
    fn seek(&mut self, target: &[u8]) {
        self.window = self.range.seeked(target, self.reverse);
        self.iter = None;
    }

    fn next(&mut self) -> Result<Option<RawEntry>, EngineError> {
        if self.iter.is_none() {
            if self.window.is_empty() {
                return Ok(None);
            }
            self.iter = Some(self.tree.range(self.window.bounds()));
        }

        let iter = match self.iter.as_mut() {
            Some(iter) => iter,
            None => return Ok(None),
        };
        let step = if self.reverse { iter.next_back() } else { iter.next() };

        match step {
            None => Ok(None),
            Some(item) => {
                let (key, value) = item?;
                Ok(Some((key.to_vec(), value.to_vec())))
            }
        }
    }
}

impl ThreadedEngine<SledBackend> {
    /// sled engine for the database directory at `path`
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        Self::spawn(SledBackend::new(path))
    }
}

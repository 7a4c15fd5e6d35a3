//! In-memory backend
//!
//! A sorted map kept in a [`MemoryVolume`]. The volume plays the role of the
//! database directory: it can be shared between engine instances, it remembers
//! whether it was ever created, and it is locked while one instance has it
//! open. Contents written by an instance become visible to later openers when
//! that instance closes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::OpenOptions;
use crate::error::EngineError;

use super::{check_compaction_range, Backend, BackendCursor, KeyRange, RawEntry, ThreadedEngine};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

// =============================================================================
// Volume
// =============================================================================

#[derive(Default)]
struct VolumeState {
    /// `None` until the first successful open creates the database
    data: Option<Arc<Map>>,
    locked: bool,
}

/// Shared storage for memory engines
///
/// Cloning a volume yields another handle to the same storage.
#[derive(Clone, Default)]
pub struct MemoryVolume {
    inner: Arc<Mutex<VolumeState>>,
}

impl MemoryVolume {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a database has been created in this volume
    pub fn exists(&self) -> bool {
        self.inner.lock().data.is_some()
    }

    /// True while an engine has the volume open
    pub fn is_locked(&self) -> bool {
        self.inner.lock().locked
    }

    /// Number of entries last published by a closing engine
    pub fn len(&self) -> usize {
        self.inner.lock().data.as_ref().map_or(0, |data| data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Backend
// =============================================================================

/// Backend over a [`MemoryVolume`]
pub struct MemoryBackend {
    location: PathBuf,
    volume: MemoryVolume,
    /// Working copy while open; cursors share it copy-on-write
    data: Option<Arc<Map>>,
}

impl MemoryBackend {
    /// Backend over a fresh, private volume
    pub fn new() -> Self {
        Self::with_volume(MemoryVolume::new())
    }

    /// Backend over an existing (possibly shared) volume
    pub fn with_volume(volume: MemoryVolume) -> Self {
        Self {
            location: PathBuf::from(":memory:"),
            volume,
            data: None,
        }
    }

    /// Name reported in diagnostics instead of `:memory:`
    pub fn named(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = location.into();
        self
    }

    fn data_mut(&mut self) -> Result<&mut Map, EngineError> {
        self.data
            .as_mut()
            .map(|data| Arc::make_mut(data))
            .ok_or(EngineError::NotOpen)
    }

    /// Drop the working copy and release the volume lock
    fn release(&mut self, publish: bool) {
        if let Some(data) = self.data.take() {
            let mut volume = self.volume.inner.lock();
            if publish {
                volume.data = Some(data);
            }
            volume.locked = false;
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    type Cursor = MemoryCursor;

    fn location(&self) -> &Path {
        &self.location
    }

    fn open(&mut self, options: &OpenOptions) -> Result<(), EngineError> {
        let mut volume = self.volume.inner.lock();

        if volume.locked {
            return Err(EngineError::Locked(self.location.clone()));
        }

        let existing = volume.data.clone();
        let data = match existing {
            Some(_) if options.error_if_exists => {
                return Err(EngineError::AlreadyExists(self.location.clone()));
            }
            Some(data) => data,
            None if !options.create_if_missing => {
                return Err(EngineError::Missing(self.location.clone()));
            }
            None => {
                let created = Arc::new(Map::new());
                volume.data = Some(Arc::clone(&created));
                created
            }
        };

        volume.locked = true;
        drop(volume);

        self.data = Some(data);
        Ok(())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        self.data_mut()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        let data = self.data.as_ref().ok_or(EngineError::NotOpen)?;
        Ok(data.get(key).cloned())
    }

    fn compact_range(&mut self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<(), EngineError> {
        check_compaction_range(start, end)?;
        // A sorted map has nothing to reorganise
        Ok(())
    }

    fn close(&mut self) -> Result<(), EngineError> {
        if self.data.is_none() {
            return Err(EngineError::NotOpen);
        }
        self.release(true);
        Ok(())
    }

    fn cursor(&mut self, range: KeyRange, reverse: bool) -> Result<MemoryCursor, EngineError> {
        let snapshot = self.data.as_ref().ok_or(EngineError::NotOpen)?;
        Ok(MemoryCursor {
            snapshot: Arc::clone(snapshot),
            window: range.clone(),
            range,
            reverse,
            last: None,
        })
    }
}

impl Drop for MemoryBackend {
    fn drop(&mut self) {
        // Unclosed writes are lost, the lock is not
        self.release(false);
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Cursor over a point-in-time snapshot of the map
pub struct MemoryCursor {
    snapshot: Arc<Map>,
    /// Range the cursor was created with
    range: KeyRange,
    /// Range left to visit after the latest seek
    window: KeyRange,
    reverse: bool,
    last: Option<Vec<u8>>,
}

impl BackendCursor for MemoryCursor {
    fn seek(&mut self, target: &[u8]) {
        self.window = self.range.seeked(target, self.reverse);
        self.last = None;
    }

    fn next(&mut self) -> Result<Option<RawEntry>, EngineError> {
        let remaining = match &self.last {
            Some(last) => self.window.after(last, self.reverse),
            None => self.window.clone(),
        };
        if remaining.is_empty() {
            return Ok(None);
        }

        let mut candidates = self.snapshot.range(remaining.bounds());
        let entry = if self.reverse {
            candidates.next_back()
        } else {
            candidates.next()
        };

        Ok(entry.map(|(key, value)| {
            self.last = Some(key.clone());
            (key.clone(), value.clone())
        }))
    }
}

impl ThreadedEngine<MemoryBackend> {
    /// In-memory engine over a fresh private volume
    pub fn in_memory() -> Result<Self, EngineError> {
        Self::spawn(MemoryBackend::new())
    }

    /// In-memory engine over a shared volume
    pub fn on_volume(volume: &MemoryVolume) -> Result<Self, EngineError> {
        Self::spawn(MemoryBackend::with_volume(volume.clone()))
    }
}

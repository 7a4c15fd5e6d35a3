//! Store Handle
//!
//! Async front for one engine instance.
//!
//! ## Responsibilities
//! - Adapt the engine's callback calls into single-result futures
//! - Track lifecycle (`New → Open → Closed`) and refuse calls that do not fit
//! - Count outstanding cursors and refuse to close while any are live
//!
//! Every operation takes `&mut self`, so two operations can never be in
//! flight on the same handle at once.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::completion::complete;
use crate::config::{IteratorOptions, OpenOptions};
use crate::cursor::Cursor;
use crate::engine::Engine;
use crate::error::{display_key, display_range, EngineError, KvError, Resource, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    New,
    Open,
    Closed,
}

/// Handle to one key-value engine instance
pub struct Store<E: Engine> {
    engine: E,
    state: StoreState,
    outstanding: Arc<AtomicUsize>,
}

impl<E: Engine> Store<E> {
    /// Wrap an engine; nothing is opened yet
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: StoreState::New,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Open the underlying database
    ///
    /// Succeeds at most once per handle. A failed open leaves the handle in
    /// `New`.
    pub async fn open(&mut self, options: OpenOptions) -> Result<()> {
        let rejected = match self.state {
            StoreState::New => None,
            StoreState::Open => Some(EngineError::AlreadyOpen),
            StoreState::Closed => Some(EngineError::Closed),
        };
        if let Some(source) = rejected {
            return Err(self.open_error(source));
        }

        let engine = &self.engine;
        complete(|callback| engine.open(options, callback))
            .await
            .map_err(|source| self.open_error(source))?;

        self.state = StoreState::Open;
        tracing::debug!("Store open at {}", self.location().display());
        Ok(())
    }

    /// Write one key/value pair
    pub async fn put(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let key = key.as_ref();
        let write_error = |source: EngineError| KvError::Write {
            key: display_key(key),
            source,
        };
        self.require_open().map_err(write_error)?;

        let engine = &self.engine;
        let (key_buf, value_buf) = (key.to_vec(), value.as_ref().to_vec());
        complete(|callback| engine.put(key_buf, value_buf, callback))
            .await
            .map_err(write_error)
    }

    /// Read one key; `Ok(None)` means not found
    pub async fn get(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let key = key.as_ref();
        let read_error = |source: EngineError| KvError::Read {
            key: display_key(key),
            source,
        };
        self.require_open().map_err(read_error)?;

        let engine = &self.engine;
        let key_buf = key.to_vec();
        let value = complete(|callback| engine.get(key_buf, callback))
            .await
            .map_err(read_error)?;
        Ok(value.map(Bytes::from))
    }

    /// Compact `[start, end)`; `None` bounds are open-ended
    pub async fn compact_range(&mut self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<()> {
        let compaction_error = |source: EngineError| KvError::Compaction {
            range: display_range(start, end),
            source,
        };
        self.require_open().map_err(compaction_error)?;
        if matches!((start, end), (Some(start), Some(end)) if start > end) {
            return Err(compaction_error(EngineError::InvalidRange));
        }

        let engine = &self.engine;
        let (start_buf, end_buf) = (start.map(<[u8]>::to_vec), end.map(<[u8]>::to_vec));
        complete(|callback| engine.compact_range(start_buf, end_buf, callback))
            .await
            .map_err(compaction_error)
    }

    /// Compact the whole keyspace
    pub async fn compact(&mut self) -> Result<()> {
        self.compact_range(None, None).await
    }

    /// Release the engine
    ///
    /// Rejected while cursors are outstanding, before open, and after a
    /// previous successful close.
    pub async fn close(&mut self) -> Result<()> {
        let close_error = |source: EngineError| KvError::Close {
            resource: Resource::Store,
            source,
        };
        self.require_open().map_err(close_error)?;

        let outstanding = self.outstanding_cursors();
        if outstanding > 0 {
            return Err(close_error(EngineError::OutstandingCursors(outstanding)));
        }

        let engine = &self.engine;
        complete(|callback| engine.close(callback))
            .await
            .map_err(close_error)?;

        self.state = StoreState::Closed;
        tracing::debug!("Store closed at {}", self.location().display());
        Ok(())
    }

    /// Create a cursor over `options`; performs no I/O
    pub fn iterator(&mut self, options: IteratorOptions) -> Result<Cursor<E::Iter>> {
        self.require_open()
            .map_err(|source| KvError::Iteration { source })?;
        let inner = self.engine.iterator(options);
        Ok(Cursor::new(inner, Arc::clone(&self.outstanding)))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn location(&self) -> &Path {
        self.engine.location()
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == StoreState::Open
    }

    /// Cursors created from this store that have not ended yet
    pub fn outstanding_cursors(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Borrow the wrapped engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn require_open(&self) -> std::result::Result<(), EngineError> {
        match self.state {
            StoreState::Open => Ok(()),
            StoreState::New => Err(EngineError::NotOpen),
            StoreState::Closed => Err(EngineError::Closed),
        }
    }

    fn open_error(&self, source: EngineError) -> KvError {
        KvError::Open {
            path: self.location().to_path_buf(),
            source,
        }
    }
}

//! Engine Module
//!
//! The callback-style boundary between the driver layer and the storage
//! engine, plus the machinery that puts a synchronous backend behind it.
//!
//! ## Responsibilities
//! - Define the callback API the store and cursor adapt (`Engine`,
//!   `EngineIterator`)
//! - Run every backend call on a dedicated worker thread and fire exactly one
//!   completion callback per call
//! - Track engine lifecycle (open / closed) and live iterators
//!
//! ## Layout
//! ```text
//!   Store / Cursor ──(job + callback)──► crossbeam channel
//!                                              │
//!                                              ▼
//!                                   ┌────────────────────┐
//!                                   │   worker thread    │
//!                                   │  Backend + cursors │
//!                                   └─────────┬──────────┘
//!                                             │ callback(result)
//!                                             ▼
//!                                     oneshot → future
//! ```
//!
//! ## Backends
//! - `sled` (feature `sled`, default): on-disk engine from the sled crate
//! - `memory`: sorted map in a shareable volume, for tests and I/O-free runs

mod range;
mod worker;
mod memory_engine;
#[cfg(feature = "sled")]
mod sled_engine;

use std::path::Path;

use crate::config::{IteratorOptions, OpenOptions};
use crate::error::EngineError;

pub use range::KeyRange;
pub use worker::{ThreadedEngine, ThreadedIterator};
pub use memory_engine::{MemoryBackend, MemoryCursor, MemoryVolume};
#[cfg(feature = "sled")]
pub use sled_engine::{SledBackend, SledCursor};

/// Completion callback; fired exactly once with the outcome of one call
pub type Callback<T> = Box<dyn FnOnce(std::result::Result<T, EngineError>) + Send + 'static>;

/// A raw key/value pair as produced by an engine iterator
pub type RawEntry = (Vec<u8>, Vec<u8>);

/// In-memory engine: a [`MemoryBackend`] on a worker thread
pub type MemoryEngine = ThreadedEngine<MemoryBackend>;

/// On-disk engine: a [`SledBackend`] on a worker thread
#[cfg(feature = "sled")]
pub type SledEngine = ThreadedEngine<SledBackend>;

// =============================================================================
// Callback Boundary
// =============================================================================

/// Callback-style key-value engine
///
/// Every method that takes a [`Callback`] returns immediately and invokes the
/// callback exactly once, possibly from another thread, when the call
/// completes.
pub trait Engine: Send + Sync + 'static {
    /// Iterator type produced by [`Engine::iterator`]
    type Iter: EngineIterator;

    /// Where the database lives (used for diagnostics)
    fn location(&self) -> &Path;

    fn open(&self, options: OpenOptions, callback: Callback<()>);

    fn put(&self, key: Vec<u8>, value: Vec<u8>, callback: Callback<()>);

    /// `Ok(None)` means not found; a found-empty value is `Ok(Some(vec![]))`
    fn get(&self, key: Vec<u8>, callback: Callback<Option<Vec<u8>>>);

    /// Compact `[start, end)`; `None` bounds are open-ended
    fn compact_range(&self, start: Option<Vec<u8>>, end: Option<Vec<u8>>, callback: Callback<()>);

    fn close(&self, callback: Callback<()>);

    /// Create an iterator; performs no I/O
    fn iterator(&self, options: IteratorOptions) -> Self::Iter;
}

/// Callback-style forward (or reverse) iterator
pub trait EngineIterator: Send + 'static {
    /// Reposition before the next `next`; synchronous
    fn seek(&mut self, target: &[u8]);

    /// `Ok(None)` is the end-of-range sentinel
    fn next(&mut self, callback: Callback<Option<RawEntry>>);

    /// Release the engine-side iterator
    fn end(&mut self, callback: Callback<()>);
}

// =============================================================================
// Synchronous Backend
// =============================================================================

/// Synchronous engine implementation driven by a [`ThreadedEngine`]
///
/// The worker thread owns the backend exclusively, so methods take `&mut self`
/// and never race. Lifecycle state (open / closed) is tracked by the worker;
/// data methods are only called while open.
pub trait Backend: Send + 'static {
    /// Cursor type; created and used only on the worker thread
    type Cursor: BackendCursor;

    fn location(&self) -> &Path;

    fn open(&mut self, options: &OpenOptions) -> Result<(), EngineError>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), EngineError>;

    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError>;

    fn compact_range(&mut self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<(), EngineError>;

    fn close(&mut self) -> Result<(), EngineError>;

    fn cursor(&mut self, range: KeyRange, reverse: bool) -> Result<Self::Cursor, EngineError>;
}

/// Positioned read over one backend
pub trait BackendCursor {
    /// First entry at or after `target` (at or before, in reverse)
    fn seek(&mut self, target: &[u8]);

    /// Next entry in cursor order, `None` at the end of the range
    fn next(&mut self) -> Result<Option<RawEntry>, EngineError>;
}

/// Reject ranges whose start sorts after their end
pub(crate) fn check_compaction_range(
    start: Option<&[u8]>,
    end: Option<&[u8]>,
) -> Result<(), EngineError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(EngineError::InvalidRange),
        _ => Ok(()),
    }
}

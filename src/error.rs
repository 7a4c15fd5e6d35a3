//! Error types for kvbench
//!
//! Two layers:
//! - [`EngineError`]: the cause, as reported by the engine boundary or by the
//!   lifecycle checks the store and cursor run in front of it.
//! - [`KvError`]: the operation that failed, with the key, range or path
//!   involved. Every public async call returns this.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Failure reported through an engine callback or a lifecycle check
#[derive(Debug, Error)]
pub enum EngineError {
    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "sled")]
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("database does not exist at {0} (create_if_missing is false)")]
    Missing(PathBuf),

    #[error("database already exists at {0} (error_if_exists is true)")]
    AlreadyExists(PathBuf),

    #[error("database at {0} is locked by another instance")]
    Locked(PathBuf),

    #[error("invalid key range: start sorts after end")]
    InvalidRange,

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("database is not open")]
    NotOpen,

    #[error("database is already open")]
    AlreadyOpen,

    #[error("database is closed")]
    Closed,

    #[error("{0} cursor(s) still outstanding")]
    OutstandingCursors(usize),

    #[error("unknown iterator id {0}")]
    UnknownIterator(u64),

    #[error("iterator {id} could not be created: {reason}")]
    IteratorUnavailable { id: u64, reason: String },

    #[error("iterator has already ended")]
    IteratorEnded,

    #[error("iterator is exhausted; end it and open a new one")]
    IteratorExhausted,

    #[error("seek is only allowed before the first next")]
    SeekAfterNext,

    // -------------------------------------------------------------------------
    // Completion Errors
    // -------------------------------------------------------------------------
    #[error("completion callback was dropped without firing")]
    Abandoned,

    #[error("engine worker thread is gone")]
    WorkerGone,
}

/// Which handle a close failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Store,
    Cursor,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Store => f.write_str("store"),
            Resource::Cursor => f.write_str("cursor"),
        }
    }
}

/// Operation-level error for kvbench
#[derive(Debug, Error)]
pub enum KvError {
    #[error("open failed for {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("write failed for key {key:?}: {source}")]
    Write {
        key: String,
        #[source]
        source: EngineError,
    },

    #[error("read failed for key {key:?}: {source}")]
    Read {
        key: String,
        #[source]
        source: EngineError,
    },

    #[error("iteration failed: {source}")]
    Iteration {
        #[source]
        source: EngineError,
    },

    #[error("compaction failed for range {range}: {source}")]
    Compaction {
        range: String,
        #[source]
        source: EngineError,
    },

    #[error("close failed for {resource}: {source}")]
    Close {
        resource: Resource,
        #[source]
        source: EngineError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KvError {
    /// The engine-level cause, if this error carries one
    pub fn cause(&self) -> Option<&EngineError> {
        match self {
            KvError::Open { source, .. }
            | KvError::Write { source, .. }
            | KvError::Read { source, .. }
            | KvError::Iteration { source }
            | KvError::Compaction { source, .. }
            | KvError::Close { source, .. } => Some(source),
            KvError::Config(_) | KvError::Io(_) => None,
        }
    }
}

/// Render a key for error messages and logs
pub fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

/// Render a compaction range for error messages and logs
pub fn display_range(start: Option<&[u8]>, end: Option<&[u8]>) -> String {
    let start = start.map(display_key).unwrap_or_else(|| "..".to_string());
    let end = end.map(display_key).unwrap_or_else(|| "..".to_string());
    format!("[{start}, {end})")
}

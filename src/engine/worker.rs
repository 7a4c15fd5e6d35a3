//! Engine worker
//!
//! Runs a [`Backend`] on its own thread and exposes it through the callback
//! API. Jobs are processed strictly in submission order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};

use crate::config::{IteratorOptions, OpenOptions};
use crate::error::{display_key, display_range, EngineError};

use super::{Backend, BackendCursor, Callback, Engine, EngineIterator, KeyRange, RawEntry};

/// Work item sent to the worker thread
enum Job {
    Open {
        options: OpenOptions,
        callback: Callback<()>,
    },
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        callback: Callback<()>,
    },
    Get {
        key: Vec<u8>,
        callback: Callback<Option<Vec<u8>>>,
    },
    CompactRange {
        start: Option<Vec<u8>>,
        end: Option<Vec<u8>>,
        callback: Callback<()>,
    },
    Close {
        callback: Callback<()>,
    },
    IterCreate {
        id: u64,
        options: IteratorOptions,
    },
    IterNext {
        id: u64,
        seek: Option<Vec<u8>>,
        callback: Callback<Option<RawEntry>>,
    },
    IterEnd {
        id: u64,
        callback: Callback<()>,
    },
    CountIterators {
        callback: Callback<usize>,
    },
}

impl Job {
    /// Resolve the job's callback with `error` without running it
    fn fail(self, error: EngineError) {
        match self {
            Job::Open { callback, .. }
            | Job::Put { callback, .. }
            | Job::CompactRange { callback, .. }
            | Job::Close { callback }
            | Job::IterEnd { callback, .. } => callback(Err(error)),
            Job::Get { callback, .. } => callback(Err(error)),
            Job::IterNext { callback, .. } => callback(Err(error)),
            Job::CountIterators { callback } => callback(Err(error)),
            Job::IterCreate { .. } => {}
        }
    }
}

/// Submit a job, resolving its callback in place if the worker is gone
fn submit(jobs: &Sender<Job>, job: Job) {
    if let Err(channel::SendError(job)) = jobs.send(job) {
        job.fail(EngineError::WorkerGone);
    }
}

// =============================================================================
// Engine Handle
// =============================================================================

/// A [`Backend`] behind a worker thread, speaking the callback API
///
/// The worker exits once this handle and every iterator created from it have
/// been dropped; the backend is dropped on the worker thread.
pub struct ThreadedEngine<B: Backend> {
    location: PathBuf,
    jobs: Sender<Job>,
    next_iterator_id: AtomicU64,
    _backend: std::marker::PhantomData<fn() -> B>,
}

impl<B: Backend> ThreadedEngine<B> {
    /// Move `backend` onto a new worker thread
    pub fn spawn(backend: B) -> Result<Self, EngineError> {
        let location = backend.location().to_path_buf();
        let (jobs, inbox) = channel::unbounded();

        let name = format!("kvbench-engine:{}", location.display());
        thread::Builder::new()
            .name(name)
            .spawn(move || Worker::new(backend).run(inbox))?;

        tracing::debug!("Engine worker started for {}", location.display());

        Ok(Self {
            location,
            jobs,
            next_iterator_id: AtomicU64::new(1),
            _backend: std::marker::PhantomData,
        })
    }
}

impl<B: Backend> Engine for ThreadedEngine<B> {
    type Iter = ThreadedIterator;

    fn location(&self) -> &Path {
        &self.location
    }

    fn open(&self, options: OpenOptions, callback: Callback<()>) {
        submit(&self.jobs, Job::Open { options, callback });
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>, callback: Callback<()>) {
        submit(&self.jobs, Job::Put { key, value, callback });
    }

    fn get(&self, key: Vec<u8>, callback: Callback<Option<Vec<u8>>>) {
        submit(&self.jobs, Job::Get { key, callback });
    }

    fn compact_range(&self, start: Option<Vec<u8>>, end: Option<Vec<u8>>, callback: Callback<()>) {
        submit(&self.jobs, Job::CompactRange { start, end, callback });
    }

    fn close(&self, callback: Callback<()>) {
        submit(&self.jobs, Job::Close { callback });
    }

    fn iterator(&self, options: IteratorOptions) -> ThreadedIterator {
        let id = self.next_iterator_id.fetch_add(1, Ordering::Relaxed);
        submit(&self.jobs, Job::IterCreate { id, options });
        ThreadedIterator {
            id,
            jobs: self.jobs.clone(),
            pending_seek: None,
            ended: false,
        }
    }
}

impl<B: Backend> ThreadedEngine<B> {
    /// Number of iterators the worker currently holds
    pub fn live_iterators(&self, callback: Callback<usize>) {
        submit(&self.jobs, Job::CountIterators { callback });
    }
}

// =============================================================================
// Iterator Handle
// =============================================================================

/// Handle to one iterator living on the worker thread
///
/// Dropping the handle without [`end`](EngineIterator::end) still releases
/// the worker-side iterator.
pub struct ThreadedIterator {
    id: u64,
    jobs: Sender<Job>,
    /// Applied by the worker before the next step
    pending_seek: Option<Vec<u8>>,
    ended: bool,
}

impl ThreadedIterator {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl EngineIterator for ThreadedIterator {
    fn seek(&mut self, target: &[u8]) {
        self.pending_seek = Some(target.to_vec());
    }

    fn next(&mut self, callback: Callback<Option<RawEntry>>) {
        let seek = self.pending_seek.take();
        submit(&self.jobs, Job::IterNext { id: self.id, seek, callback });
    }

    fn end(&mut self, callback: Callback<()>) {
        self.ended = true;
        submit(&self.jobs, Job::IterEnd { id: self.id, callback });
    }
}

impl Drop for ThreadedIterator {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        let ignore: Callback<()> = Box::new(|_| {});
        submit(&self.jobs, Job::IterEnd { id: self.id, callback: ignore });
    }
}

// =============================================================================
// Worker Thread
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    New,
    Open,
    Closed,
}

/// Iterator state held by the worker
enum Slot<C> {
    Live {
        cursor: C,
        /// Entries still allowed by the limit (`None` = unlimited)
        remaining: Option<usize>,
    },
    /// The backend refused to create the cursor; reported on every use
    Failed { reason: String },
}

struct Worker<B: Backend> {
    backend: B,
    lifecycle: Lifecycle,
    iterators: HashMap<u64, Slot<B::Cursor>>,
}

impl<B: Backend> Worker<B> {
    fn new(backend: B) -> Self {
        Self {
            backend,
            lifecycle: Lifecycle::New,
            iterators: HashMap::new(),
        }
    }

    fn run(mut self, inbox: Receiver<Job>) {
        for job in inbox {
            self.handle(job);
        }

        // Every handle is gone; release the backend if nobody closed it
        if self.lifecycle == Lifecycle::Open {
            tracing::warn!(
                "Engine at {} dropped while open, closing",
                self.backend.location().display()
            );
            self.iterators.clear();
            if let Err(e) = self.backend.close() {
                tracing::warn!("Implicit close failed: {}", e);
            }
        }
        tracing::debug!("Engine worker for {} exiting", self.backend.location().display());
    }

    fn handle(&mut self, job: Job) {
        match job {
            Job::Open { options, callback } => callback(self.open(&options)),
            Job::Put { key, value, callback } => {
                let result = self.require_open().and_then(|_| self.backend.put(&key, &value));
                if let Err(e) = &result {
                    tracing::debug!("put {} failed: {}", display_key(&key), e);
                }
                callback(result)
            }
            Job::Get { key, callback } => {
                callback(self.require_open().and_then(|_| self.backend.get(&key)))
            }
            Job::CompactRange { start, end, callback } => {
                callback(self.compact_range(start.as_deref(), end.as_deref()))
            }
            Job::Close { callback } => callback(self.close()),
            Job::IterCreate { id, options } => self.create_iterator(id, options),
            Job::IterNext { id, seek, callback } => callback(self.step(id, seek)),
            Job::IterEnd { id, callback } => callback(self.end_iterator(id)),
            Job::CountIterators { callback } => callback(Ok(self.iterators.len())),
        }
    }

    fn require_open(&self) -> Result<(), EngineError> {
        match self.lifecycle {
            Lifecycle::Open => Ok(()),
            Lifecycle::New => Err(EngineError::NotOpen),
            Lifecycle::Closed => Err(EngineError::Closed),
        }
    }

    fn open(&mut self, options: &OpenOptions) -> Result<(), EngineError> {
        match self.lifecycle {
            Lifecycle::Open => return Err(EngineError::AlreadyOpen),
            Lifecycle::Closed => return Err(EngineError::Closed),
            Lifecycle::New => {}
        }

        self.backend.open(options)?;
        self.lifecycle = Lifecycle::Open;
        tracing::debug!("Opened {}", self.backend.location().display());
        Ok(())
    }

    fn compact_range(&mut self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<(), EngineError> {
        self.require_open()?;
        tracing::debug!("Compacting {}", display_range(start, end));
        self.backend.compact_range(start, end)
    }

    fn close(&mut self) -> Result<(), EngineError> {
        self.require_open()?;

        // Iterators still registered here were never ended; the engine
        // releases them on close
        if !self.iterators.is_empty() {
            tracing::debug!("Releasing {} iterator(s) on close", self.iterators.len());
            self.iterators.clear();
        }

        self.backend.close()?;
        self.lifecycle = Lifecycle::Closed;
        tracing::debug!("Closed {}", self.backend.location().display());
        Ok(())
    }

    fn create_iterator(&mut self, id: u64, options: IteratorOptions) {
        // Before open there is nothing to iterate; the first step reports it
        if self.require_open().is_err() {
            return;
        }

        let range = KeyRange::from_options(&options);
        let slot = match self.backend.cursor(range, options.reverse) {
            Ok(cursor) => Slot::Live {
                cursor,
                remaining: options.limit,
            },
            Err(e) => {
                tracing::warn!("Failed to create iterator {}: {}", id, e);
                Slot::Failed { reason: e.to_string() }
            }
        };
        self.iterators.insert(id, slot);
    }

    fn step(&mut self, id: u64, seek: Option<Vec<u8>>) -> Result<Option<RawEntry>, EngineError> {
        self.require_open()?;
        let (cursor, remaining) = match self.iterators.get_mut(&id) {
            Some(Slot::Live { cursor, remaining }) => (cursor, remaining),
            Some(Slot::Failed { reason }) => {
                return Err(EngineError::IteratorUnavailable {
                    id,
                    reason: reason.clone(),
                });
            }
            None => return Err(EngineError::UnknownIterator(id)),
        };

        if let Some(target) = seek {
            cursor.seek(&target);
        }

        if *remaining == Some(0) {
            return Ok(None);
        }

        let entry = cursor.next()?;
        if entry.is_some() {
            if let Some(remaining) = remaining.as_mut() {
                *remaining -= 1;
            }
        }
        Ok(entry)
    }

    fn end_iterator(&mut self, id: u64) -> Result<(), EngineError> {
        match self.iterators.remove(&id) {
            Some(Slot::Live { .. }) => Ok(()),
            Some(Slot::Failed { reason }) => Err(EngineError::IteratorUnavailable { id, reason }),
            // Closing the engine already released it
            None if self.lifecycle == Lifecycle::Closed => Ok(()),
            None if self.lifecycle == Lifecycle::New => Err(EngineError::NotOpen),
            None => Err(EngineError::UnknownIterator(id)),
        }
    }
}

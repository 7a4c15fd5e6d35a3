//! Cursor
//!
//! Sequential async pull over one engine iterator.
//!
//! ## State Machine
//! ```text
//!   Created ──seek──► Created
//!      │
//!      └──next──► Iterating ──next (sentinel)──► Exhausted
//!                                                    │
//!   (any state) ─────────────end────────────────► Ended
//! ```
//! `seek` is only accepted in `Created`; `next` is rejected once the
//! sentinel has been returned and after `end`; `end` is accepted once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::completion::complete;
use crate::engine::{Callback, EngineIterator};
use crate::error::{EngineError, KvError, Resource, Result};

/// One key/value pair yielded by a cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Bytes,
    pub value: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Created,
    Iterating,
    Exhausted,
    Ended,
}

/// Scoped read position over a key range
///
/// Created by [`Store::iterator`](crate::Store::iterator). Call
/// [`end`](Cursor::end) on every path; a cursor dropped without it releases
/// its engine iterator from `Drop` and logs a warning.
pub struct Cursor<I: EngineIterator> {
    inner: I,
    state: CursorState,
    /// Shared with the parent store; decremented once when this cursor ends
    outstanding: Arc<AtomicUsize>,
}

impl<I: EngineIterator> Cursor<I> {
    pub(crate) fn new(inner: I, outstanding: Arc<AtomicUsize>) -> Self {
        outstanding.fetch_add(1, Ordering::SeqCst);
        Self {
            inner,
            state: CursorState::Created,
            outstanding,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Position the cursor at the first key at or after `key`
    ///
    /// Only valid before the first [`next`](Cursor::next).
    pub fn seek(&mut self, key: impl AsRef<[u8]>) -> Result<()> {
        match self.state {
            CursorState::Created => {
                self.inner.seek(key.as_ref());
                Ok(())
            }
            CursorState::Ended => Err(iteration(EngineError::IteratorEnded)),
            CursorState::Iterating | CursorState::Exhausted => {
                Err(iteration(EngineError::SeekAfterNext))
            }
        }
    }

    /// Advance one entry; `Ok(None)` is the end-of-range sentinel
    pub async fn next(&mut self) -> Result<Option<Entry>> {
        match self.state {
            CursorState::Ended => return Err(iteration(EngineError::IteratorEnded)),
            CursorState::Exhausted => return Err(iteration(EngineError::IteratorExhausted)),
            CursorState::Created | CursorState::Iterating => {}
        }

        let inner = &mut self.inner;
        let step = complete(|callback| inner.next(callback))
            .await
            .map_err(iteration)?;

        match step {
            Some((key, value)) => {
                self.state = CursorState::Iterating;
                Ok(Some(Entry {
                    key: Bytes::from(key),
                    value: Bytes::from(value),
                }))
            }
            None => {
                self.state = CursorState::Exhausted;
                Ok(None)
            }
        }
    }

    /// Release the engine iterator
    ///
    /// The cursor counts as ended even if the engine reports a failure, so
    /// the release is never attempted twice.
    pub async fn end(&mut self) -> Result<()> {
        if self.state == CursorState::Ended {
            return Err(KvError::Close {
                resource: Resource::Cursor,
                source: EngineError::IteratorEnded,
            });
        }

        self.mark_ended();
        let inner = &mut self.inner;
        complete(|callback| inner.end(callback))
            .await
            .map_err(|source| KvError::Close {
                resource: Resource::Cursor,
                source,
            })
    }

    fn mark_ended(&mut self) {
        self.state = CursorState::Ended;
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<I: EngineIterator> Drop for Cursor<I> {
    fn drop(&mut self) {
        if self.state == CursorState::Ended {
            return;
        }

        tracing::warn!("Cursor dropped without end(); releasing its iterator");
        self.mark_ended();
        let ignore: Callback<()> = Box::new(|result| {
            if let Err(e) = result {
                tracing::debug!("Implicit iterator release failed: {}", e);
            }
        });
        self.inner.end(ignore);
    }
}

fn iteration(source: EngineError) -> KvError {
    KvError::Iteration { source }
}

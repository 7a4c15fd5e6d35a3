//! Callback-to-future adaptation
//!
//! Each engine call gets a fresh oneshot channel; the callback handed to the
//! engine owns the sender. The callback is `FnOnce`, so it resolves the
//! future at most once. A callback dropped without firing resolves it with
//! [`EngineError::Abandoned`].

use tokio::sync::oneshot;

use crate::engine::Callback;
use crate::error::EngineError;

/// Issue one callback-style call and wait for its single result
pub(crate) async fn complete<T, F>(issue: F) -> Result<T, EngineError>
where
    T: Send + 'static,
    F: FnOnce(Callback<T>),
{
    let (tx, rx) = oneshot::channel();

    issue(Box::new(move |result| {
        // The receiver is gone only if the caller stopped waiting
        let _ = tx.send(result);
    }));

    rx.await.map_err(|_| EngineError::Abandoned)?
}

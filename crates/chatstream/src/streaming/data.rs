use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::errors::StreamDataError;

struct Inner {
    pending: Mutex<Vec<Value>>,
    closed: watch::Sender<bool>,
}

/// Append-only side channel of JSON values sent alongside the token stream
///
/// Clones share the same channel, so one handle can be moved into a completion callback while
/// the response keeps another.
#[derive(Clone)]
pub struct StreamData {
    inner: Arc<Inner>,
}

impl StreamData {
    pub fn new() -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(Vec::new()),
                closed,
            }),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Vec<Value>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a value for the next flush
    pub fn append<V: Into<Value>>(&self, value: V) -> Result<(), StreamDataError> {
        let mut pending = self.pending();
        if self.is_closed() {
            return Err(StreamDataError::Closed);
        }
        pending.push(value.into());
        Ok(())
    }

    /// Stop accepting values; the response flushes what is left and ends
    pub fn close(&self) -> Result<(), StreamDataError> {
        let _pending = self.pending();
        if self.inner.closed.send_replace(true) {
            return Err(StreamDataError::AlreadyClosed);
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    /// Drain the values appended since the last flush
    pub fn take_pending(&self) -> Vec<Value> {
        std::mem::take(&mut *self.pending())
    }

    /// Resolves once the channel is closed
    pub async fn closed(&self) {
        let mut rx = self.inner.closed.subscribe();
        // the sender lives as long as self, so this only returns once closed
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl Default for StreamData {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamData")
            .field("pending", &self.pending().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

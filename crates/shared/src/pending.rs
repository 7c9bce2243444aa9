//! Outstanding requests keyed by a correlation or request id.
//!
//! One tracker serves both the message bridge (keyed by correlation id) and
//! the socket protocol client (keyed by request id).

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::BridgeError;

pub type PendingResult = Result<Value, BridgeError>;

/// Bridge calls awaiting a `response` or `error` message.
pub type PendingCalls = PendingMap<PendingResult>;

/// Another request with this id is still waiting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Id already pending: {0}")]
pub struct DuplicateId(pub String);

/// Pending request tracker for request/reply correlation
pub struct PendingMap<T> {
    inner: HashMap<String, oneshot::Sender<T>>,
}

impl<T> Default for PendingMap<T> {
    fn default() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }
}

impl<T> fmt::Debug for PendingMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMap")
            .field("ids", &self.inner.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> PendingMap<T> {
    /// Register a waiter. A second insert for the same id is refused.
    pub fn insert(&mut self, id: String, tx: oneshot::Sender<T>) -> Result<(), DuplicateId> {
        if self.inner.contains_key(&id) {
            return Err(DuplicateId(id));
        }
        self.inner.insert(id, tx);
        Ok(())
    }

    /// Settle a pending request.
    ///
    /// Returns false if nothing is waiting under this id (already timed out
    /// and cleaned up, or never sent from here).
    pub fn resolve(&mut self, id: &str, value: T) -> bool {
        if let Some(tx) = self.inner.remove(id) {
            let _ = tx.send(value);
            true
        } else {
            tracing::debug!(
                id = %id,
                "Reply for unknown id - request may have timed out"
            );
            false
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.inner.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every waiter; their receivers see the sender go away.
    pub fn clear(&mut self) -> usize {
        let count = self.inner.len();
        self.inner.clear();
        count
    }
}

//! Command Bus for sending protocol commands to the engine.
//!
//! Supports fire-and-forget lines and request-response commands. Replies are
//! matched to requests by the echoed request `id`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot, Mutex};
use widgetry_protocol::{ClientCommand, ServerReply};
use widgetry_shared::PendingMap;

use crate::error::RequestError;

/// Protocol requests awaiting the reply that echoes their id.
pub type PendingRequests = PendingMap<ServerReply>;

/// Command bus for sending lines to the engine.
///
/// Cheap to clone. The connection task owns the socket and feeds replies back
/// through the shared [`PendingRequests`].
#[derive(Clone)]
pub struct CommandBus {
    tx: mpsc::Sender<String>,
    pending: Arc<Mutex<PendingRequests>>,
    timeout: Duration,
}

impl CommandBus {
    pub fn new(
        tx: mpsc::Sender<String>,
        pending: Arc<Mutex<PendingRequests>>,
        timeout: Duration,
    ) -> Self {
        Self {
            tx,
            pending,
            timeout,
        }
    }

    /// Queue a raw line without waiting for anything back.
    pub fn send_raw(&self, line: impl Into<String>) -> Result<()> {
        self.tx
            .try_send(line.into())
            .map_err(|e| anyhow::anyhow!("CommandBus send failed: {}", e))
    }

    /// Send a command and await the reply carrying its id.
    pub async fn request(&self, command: ClientCommand) -> Result<ServerReply, RequestError> {
        self.request_with_timeout(command, self.timeout).await
    }

    /// Send a command with a custom timeout.
    ///
    /// If the request times out, the pending entry is removed so a late reply
    /// is dropped instead of leaking.
    pub async fn request_with_timeout(
        &self,
        command: ClientCommand,
        timeout: Duration,
    ) -> Result<ServerReply, RequestError> {
        let id = command.request_id().to_string();
        let line = serde_json::to_string(&command)
            .map_err(|e| RequestError::SerializationError(e.to_string()))?;

        let (reply_tx, reply_rx) = oneshot::channel();

        // Register pending request before sending
        self.pending.lock().await.insert(id.clone(), reply_tx)?;

        if self.tx.send(line).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(RequestError::SendFailed("connection closed".into()));
        }

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(result) => result.map_err(|_| RequestError::Cancelled),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                tracing::debug!(
                    request_id = %id,
                    timeout_ms = %timeout.as_millis(),
                    "Request timed out - cleaned up pending request entry"
                );
                Err(RequestError::Timeout(timeout))
            }
        }
    }

    /// Get access to pending requests (for the connection task)
    pub fn pending(&self) -> Arc<Mutex<PendingRequests>> {
        Arc::clone(&self.pending)
    }
}

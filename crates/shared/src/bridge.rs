//! Message bridge
//!
//! Request/reply and event passing between two runtimes that share no memory.
//! Outbound requests get a correlation id and a pending entry; inbound replies
//! settle the entry; everything else goes to the handler registered for the
//! message's `id`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{oneshot, Mutex};
use widgetry_domain::CorrelationId;
use widgetry_protocol::{Message, MessageType};

use crate::error::BridgeError;
use crate::pending::{PendingCalls, PendingResult};
use crate::transport::MessageTransport;

/// Default request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub request_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl BridgeConfig {
    pub fn with_timeout(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

/// Inbound message handler for one id.
///
/// For `request` messages the returned value becomes the `response` payload
/// and an error becomes an `error` reply. For other kinds the result is only
/// logged.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: Message) -> Result<Value, BridgeError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, BridgeError>> + Send,
{
    async fn handle(&self, message: Message) -> Result<Value, BridgeError> {
        (self.0)(message).await
    }
}

/// Wrap an async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, BridgeError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

pub struct MessageBridge {
    name: String,
    handlers: DashMap<String, Arc<dyn MessageHandler>>,
    pending: Mutex<PendingCalls>,
    transport: Arc<dyn MessageTransport>,
    config: BridgeConfig,
}

impl MessageBridge {
    pub fn new(
        name: impl Into<String>,
        transport: Arc<dyn MessageTransport>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            name: name.into(),
            handlers: DashMap::new(),
            pending: Mutex::new(PendingCalls::default()),
            transport,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Handler registry
    // -------------------------------------------------------------------------

    /// One handler per id; a later registration replaces the earlier one.
    pub fn register_handler(&self, id: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        let id = id.into();
        if self.handlers.insert(id.clone(), handler).is_some() {
            tracing::debug!(bridge = %self.name, handler_id = %id, "Replaced message handler");
        } else {
            tracing::debug!(bridge = %self.name, handler_id = %id, "Registered message handler");
        }
    }

    pub fn unregister_handler(&self, id: &str) -> bool {
        let removed = self.handlers.remove(id).is_some();
        if removed {
            tracing::debug!(bridge = %self.name, handler_id = %id, "Unregistered message handler");
        }
        removed
    }

    pub fn has_handler(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    // -------------------------------------------------------------------------
    // Outbound
    // -------------------------------------------------------------------------

    /// Send a message. Requests wait for the peer's reply and resolve with
    /// its payload; every other kind resolves with null once delivered.
    pub async fn send_message(&self, mut message: Message) -> Result<Value, BridgeError> {
        if !message.expects_reply() {
            self.transport.send(message).await?;
            return Ok(Value::Null);
        }

        let correlation_id = message
            .correlation_id
            .get_or_insert_with(|| CorrelationId::new().to_string())
            .clone();

        let (tx, rx) = oneshot::channel::<PendingResult>();
        self.pending.lock().await.insert(correlation_id.clone(), tx)?;

        tracing::debug!(
            bridge = %self.name,
            target = %message.id,
            action = %message.action,
            correlation_id = %correlation_id,
            "Sending bridge request"
        );

        if let Err(e) = self.transport.send(message).await {
            self.pending.lock().await.remove(&correlation_id);
            return Err(e);
        }

        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BridgeError::Cancelled),
            Err(_) => {
                self.pending.lock().await.remove(&correlation_id);
                tracing::debug!(
                    bridge = %self.name,
                    correlation_id = %correlation_id,
                    timeout_ms = %timeout.as_millis(),
                    "Request timed out - cleaned up pending entry"
                );
                Err(BridgeError::Timeout(timeout))
            }
        }
    }

    pub async fn request(
        &self,
        id: impl Into<String>,
        action: impl Into<String>,
        payload: Value,
    ) -> Result<Value, BridgeError> {
        self.send_message(Message::request(id, action, payload))
            .await
    }

    /// Fire-and-forget event.
    pub async fn emit(
        &self,
        id: impl Into<String>,
        action: impl Into<String>,
        payload: Value,
    ) -> Result<(), BridgeError> {
        self.send_message(Message::event(id, action, payload))
            .await
            .map(|_| ())
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Fail every in-flight request with `Cancelled`.
    pub async fn cancel_pending(&self) -> usize {
        self.pending.lock().await.clear()
    }

    // -------------------------------------------------------------------------
    // Inbound
    // -------------------------------------------------------------------------

    /// Parse and dispatch one raw line. Malformed input is logged and dropped.
    pub async fn receive_raw(&self, raw: &str) {
        match serde_json::from_str::<Message>(raw) {
            Ok(message) => self.receive_message(message).await,
            Err(e) => {
                tracing::warn!(bridge = %self.name, error = %e, "Dropping malformed bridge message");
            }
        }
    }

    /// Settle a pending call or dispatch to the registered handler.
    ///
    /// Handlers run on the caller's task, so a handler must not await a
    /// request to the peer that feeds this bridge.
    pub async fn receive_message(&self, message: Message) {
        if message.kind.is_reply() {
            if let Some(correlation_id) = message.correlation_id.as_deref() {
                let result = match message.kind {
                    MessageType::Error => Err(BridgeError::Remote(message.payload.clone())),
                    _ => Ok(message.payload.clone()),
                };
                if self.pending.lock().await.resolve(correlation_id, result) {
                    return;
                }
            }
        }

        // Clone out of the map so no shard lock is held across the await
        let handler = self.handlers.get(&message.id).map(|h| Arc::clone(h.value()));
        let Some(handler) = handler else {
            if message.kind.is_reply() {
                tracing::debug!(bridge = %self.name, target = %message.id, "Dropping unmatched reply");
            } else {
                tracing::warn!(
                    bridge = %self.name,
                    target = %message.id,
                    action = %message.action,
                    "No handler registered, dropping message"
                );
            }
            return;
        };

        let expects_reply = message.expects_reply();
        let envelope = message.clone();
        let result = handler.handle(message).await;

        if !expects_reply {
            if let Err(e) = result {
                tracing::warn!(
                    bridge = %self.name,
                    target = %envelope.id,
                    action = %envelope.action,
                    error = %e,
                    "Handler failed on non-request message"
                );
            }
            return;
        }

        let reply = match result {
            Ok(payload) => envelope.response(payload),
            Err(e) => {
                tracing::debug!(
                    bridge = %self.name,
                    target = %envelope.id,
                    action = %envelope.action,
                    error = %e,
                    "Handler failed, replying with error"
                );
                envelope.error_reply(e.to_string())
            }
        };

        if let Err(e) = self.transport.send(reply).await {
            tracing::warn!(bridge = %self.name, target = %envelope.id, error = %e, "Failed to send reply");
        }
    }
}

impl std::fmt::Debug for MessageBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBridge")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .field("config", &self.config)
            .finish()
    }
}

//! Event Bus for component events arriving from the engine.
//!
//! Push-based: subscribers register callbacks that are invoked when events
//! arrive over the bridge.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use widgetry_protocol::Message;

/// One component event as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    pub component_id: String,
    pub action: String,
    pub payload: Value,
}

impl From<Message> for HostEvent {
    fn from(message: Message) -> Self {
        Self {
            component_id: message.id,
            action: message.action,
            payload: message.payload,
        }
    }
}

type Subscriber = Box<dyn FnMut(&HostEvent) + Send + 'static>;

/// Event bus for component events.
///
/// The bus holds strong references to subscribers, so they persist until
/// cleared or the bus is dropped.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event.
    pub async fn subscribe(&self, callback: impl FnMut(&HostEvent) + Send + 'static) {
        self.subscribers.lock().await.push(Box::new(callback));
    }

    /// Subscribe to one action only, e.g. `select:opened`.
    pub async fn subscribe_action(
        &self,
        action: impl Into<String>,
        mut callback: impl FnMut(&HostEvent) + Send + 'static,
    ) {
        let action = action.into();
        self.subscribe(move |event| {
            if event.action == action {
                callback(event);
            }
        })
        .await;
    }

    /// Dispatch an event to all subscribers in subscription order.
    pub async fn dispatch(&self, event: HostEvent) {
        let mut subscribers = self.subscribers.lock().await;
        for subscriber in subscribers.iter_mut() {
            subscriber(&event);
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub async fn clear(&self) {
        self.subscribers.lock().await.clear();
    }
}

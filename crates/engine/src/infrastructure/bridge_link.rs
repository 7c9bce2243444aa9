//! Engine side of the message bridge.
//!
//! - [`EngineLink`] turns component events into bridge `event` messages and
//!   drops a component's handler when it is destroyed.
//! - [`ComponentHandler`] answers `callMethod`, `updateState` and `getState`
//!   requests addressed to one component id.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use widgetry_domain::{ComponentEvent, ComponentLink};
use widgetry_protocol::{actions, Message};
use widgetry_shared::{BridgeError, MessageBridge, MessageHandler};

use crate::use_cases::ComponentService;

pub struct EngineLink {
    events: mpsc::UnboundedSender<ComponentEvent>,
    bridge: Arc<MessageBridge>,
}

impl EngineLink {
    /// Build the link and its event forwarder. Must be called inside a tokio
    /// runtime; the forwarder stops when the link is dropped.
    pub fn spawn(bridge: Arc<MessageBridge>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ComponentEvent>();
        let forward_bridge = Arc::clone(&bridge);

        let forwarder = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = forward_bridge
                    .emit(event.component_id.clone(), event.action.clone(), event.payload)
                    .await
                {
                    tracing::warn!(
                        component_id = %event.component_id,
                        action = %event.action,
                        error = %e,
                        "Failed to forward component event"
                    );
                }
            }
            tracing::debug!("Component event forwarder stopped");
        });

        (Self { events: tx, bridge }, forwarder)
    }
}

impl ComponentLink for EngineLink {
    fn emit(&self, event: ComponentEvent) {
        tracing::trace!(component_id = %event.component_id, action = %event.action, "Component event");
        if self.events.send(event).is_err() {
            tracing::debug!("Event forwarder gone, dropping component event");
        }
    }

    fn detach(&self, component_id: &str) {
        self.bridge.unregister_handler(component_id);
    }
}

/// Bridge handler for one loaded component.
pub struct ComponentHandler {
    service: Weak<ComponentService>,
    component_id: String,
}

impl ComponentHandler {
    pub fn new(service: Weak<ComponentService>, component_id: impl Into<String>) -> Self {
        Self {
            service,
            component_id: component_id.into(),
        }
    }
}

#[async_trait]
impl MessageHandler for ComponentHandler {
    async fn handle(&self, message: Message) -> Result<Value, BridgeError> {
        let service = self
            .service
            .upgrade()
            .ok_or_else(|| BridgeError::handler("Engine is shutting down"))?;
        let id = self.component_id.as_str();

        match message.action.as_str() {
            actions::CALL_METHOD => {
                let method = message
                    .payload
                    .get("method")
                    .and_then(Value::as_str)
                    .ok_or_else(|| BridgeError::handler("callMethod requires a method name"))?;
                let args = message
                    .payload
                    .get("args")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                service
                    .call_method(id, method, &args)
                    .await
                    .map_err(BridgeError::handler)
            }
            actions::UPDATE_STATE => {
                let Value::Object(patch) = message.payload else {
                    return Err(BridgeError::handler("updateState payload must be an object"));
                };
                service
                    .update_state(id, patch)
                    .await
                    .map(|_| Value::Bool(true))
                    .map_err(BridgeError::handler)
            }
            actions::GET_STATE => service.get_state(id).await.map_err(BridgeError::handler),
            other => Err(BridgeError::handler(format!(
                "Unknown action '{other}' for component {id}"
            ))),
        }
    }
}

//! Host-side handle to a component living in the engine.
//!
//! Holds only the component id. Every operation is a bridge request, so the
//! engine remains the single owner of component state.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use widgetry_protocol::{actions, Message, MessageType};
use widgetry_shared::{handler_fn, MessageBridge};

use crate::error::RemoteError;
use crate::infrastructure::messaging::{EventBus, HostEvent};

#[derive(Debug, Clone)]
pub struct RemoteComponent {
    id: String,
    bridge: Arc<MessageBridge>,
}

impl RemoteComponent {
    pub fn new(id: impl Into<String>, bridge: Arc<MessageBridge>) -> Self {
        Self {
            id: id.into(),
            bridge,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn call_method(&self, method: &str, args: Vec<Value>) -> Result<Value, RemoteError> {
        let result = self
            .bridge
            .request(
                self.id.as_str(),
                actions::CALL_METHOD,
                json!({ "method": method, "args": args }),
            )
            .await?;
        Ok(result)
    }

    pub async fn update_state(&self, patch: Map<String, Value>) -> Result<(), RemoteError> {
        self.bridge
            .request(self.id.as_str(), actions::UPDATE_STATE, Value::Object(patch))
            .await?;
        Ok(())
    }

    pub async fn get_state(&self) -> Result<Value, RemoteError> {
        Ok(self
            .bridge
            .request(self.id.as_str(), actions::GET_STATE, Value::Null)
            .await?)
    }

    /// Forward this component's events into `events`. Replaces any earlier
    /// listener for the same id.
    pub fn listen(&self, events: &EventBus) {
        let events = events.clone();
        self.bridge.register_handler(
            self.id.as_str(),
            handler_fn(move |message: Message| {
                let events = events.clone();
                async move {
                    if message.kind == MessageType::Event {
                        events.dispatch(HostEvent::from(message)).await;
                    }
                    Ok(Value::Null)
                }
            }),
        );
    }

    pub fn stop_listening(&self) -> bool {
        self.bridge.unregister_handler(&self.id)
    }
}

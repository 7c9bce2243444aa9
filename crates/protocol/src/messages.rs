//! Bridge envelope exchanged between the host runtime and the embedded runtime
//!
//! Every message names a target (`id`), a kind (`type`), an `action` and an
//! opaque `payload`. Requests that expect a reply carry a `correlationId`
//! which the reply copies verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known `action` values.
pub mod actions {
    /// Invoke a component method. Payload: `{ "method": String, "args": [..] }`
    pub const CALL_METHOD: &str = "callMethod";
    /// Patch component state. Payload: a JSON object of field -> value.
    pub const UPDATE_STATE: &str = "updateState";
    /// Read a component state snapshot.
    pub const GET_STATE: &str = "getState";
}

/// Kind of a bridge message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Expects a `response` or `error` carrying the same correlation id
    Request,
    /// Successful reply to a request
    Response,
    /// Fire-and-forget notification
    Event,
    /// Failed reply to a request
    Error,
}

impl MessageType {
    /// Whether this kind settles a pending request.
    pub fn is_reply(self) -> bool {
        matches!(self, MessageType::Response | MessageType::Error)
    }
}

/// Bridge message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Target component (or conversation) id
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub action: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Message {
    /// Create a request. The bridge assigns a correlation id when sending.
    pub fn request(id: impl Into<String>, action: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            kind: MessageType::Request,
            action: action.into(),
            payload,
            correlation_id: None,
        }
    }

    /// Create a fire-and-forget event.
    pub fn event(id: impl Into<String>, action: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            kind: MessageType::Event,
            action: action.into(),
            payload,
            correlation_id: None,
        }
    }

    /// Build the successful reply to this message.
    pub fn response(&self, payload: Value) -> Self {
        Self {
            id: self.id.clone(),
            kind: MessageType::Response,
            action: self.action.clone(),
            payload,
            correlation_id: self.correlation_id.clone(),
        }
    }

    /// Build the failed reply to this message.
    pub fn error_reply(&self, message: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            kind: MessageType::Error,
            action: self.action.clone(),
            payload: serde_json::json!({ "message": message.into() }),
            correlation_id: self.correlation_id.clone(),
        }
    }

    /// Attach a correlation id.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Whether the sender waits for a reply.
    pub fn expects_reply(&self) -> bool {
        self.kind == MessageType::Request
    }
}

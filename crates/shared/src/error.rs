//! Message bridge errors.

use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// No reply within the configured window. The pending entry is gone.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Peer answered with an `error` message; carries its payload.
    #[error("Remote error: {}", remote_text(.0))]
    Remote(Value),

    /// Transport could not deliver the message.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request with this correlation id is already in flight.
    #[error("Correlation id already pending: {0}")]
    DuplicateCorrelation(String),

    /// A local handler failed; becomes an `error` reply.
    #[error("{0}")]
    Handler(String),

    /// Pending call dropped without a reply (bridge shut down).
    #[error("Request cancelled")]
    Cancelled,
}

impl BridgeError {
    pub fn handler(message: impl ToString) -> Self {
        Self::Handler(message.to_string())
    }

    pub fn transport(message: impl ToString) -> Self {
        Self::Transport(message.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// `message` field of a remote error payload.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Remote(payload) => payload.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}

impl From<crate::pending::DuplicateId> for BridgeError {
    fn from(err: crate::pending::DuplicateId) -> Self {
        Self::DuplicateCorrelation(err.0)
    }
}

fn remote_text(payload: &Value) -> String {
    payload
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| payload.to_string(), str::to_string)
}

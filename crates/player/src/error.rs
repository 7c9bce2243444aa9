//! Host-side error types.

use std::time::Duration;

use serde_json::Value;
use widgetry_protocol::ErrorCode;
use widgetry_shared::{BridgeError, DuplicateId};

/// Failure of a protocol client request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    /// Connection task went away before a reply arrived
    #[error("Request was cancelled")]
    Cancelled,

    /// No reply in time. The pending entry has been removed.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Failed to send request: {0}")]
    SendFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Another request with this id is still waiting
    #[error("Request id already in flight: {0}")]
    DuplicateId(String),

    /// Server answered with an `error` reply
    #[error("{code}: {message}")]
    Server { code: ErrorCode, message: String },

    /// Server answered with a reply of the wrong type
    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),
}

impl From<DuplicateId> for RequestError {
    fn from(err: DuplicateId) -> Self {
        Self::DuplicateId(err.0)
    }
}

impl RequestError {
    /// Wire code when the server rejected the command.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Server { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Failure of a remote component call over the bridge.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Unexpected result from {method}: {value}")]
    UnexpectedResult { method: String, value: Value },
}

impl RemoteError {
    pub fn unexpected(method: impl Into<String>, value: Value) -> Self {
        Self::UnexpectedResult {
            method: method.into(),
            value,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Bridge(e) if e.is_timeout())
    }

    /// `message` of the engine's error reply, if that is what failed.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Bridge(e) => e.remote_message(),
            Self::UnexpectedResult { .. } => None,
        }
    }
}

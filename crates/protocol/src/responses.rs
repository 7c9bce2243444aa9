//! Reply lines written by the remote command protocol server
//!
//! Every reply echoes the `id` of the command that produced it so a client
//! with several requests in flight on one connection can demultiplex them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Server Reply
// =============================================================================

/// Result of a protocol command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerReply {
    ComponentLoaded {
        id: String,
        success: bool,
        name: String,
        component_id: String,
        methods: Vec<String>,
    },
    MethodResult {
        id: String,
        component_id: String,
        method: String,
        result: Value,
    },
    ComponentState {
        id: String,
        component_id: String,
        state: Value,
    },
    PropsSet {
        id: String,
        component_id: String,
        success: bool,
    },
    ComponentUnloaded {
        id: String,
        component_id: String,
        success: bool,
    },
    Pong {
        id: String,
    },
    AllCleaned {
        id: String,
        /// Number of components destroyed
        count: usize,
    },
    /// Command failed; the connection stays open
    Error {
        /// `None` when the request line could not be parsed far enough to read it
        id: Option<String>,
        /// Human-readable message
        error: String,
        code: ErrorCode,
    },
}

impl ServerReply {
    /// Create an error reply
    pub fn error(id: Option<String>, code: ErrorCode, error: impl Into<String>) -> Self {
        ServerReply::Error {
            id,
            error: error.into(),
            code,
        }
    }

    /// The echoed request id
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ServerReply::ComponentLoaded { id, .. }
            | ServerReply::MethodResult { id, .. }
            | ServerReply::ComponentState { id, .. }
            | ServerReply::PropsSet { id, .. }
            | ServerReply::ComponentUnloaded { id, .. }
            | ServerReply::Pong { id }
            | ServerReply::AllCleaned { id, .. } => Some(id),
            ServerReply::Error { id, .. } => id.as_deref(),
        }
    }

    /// Check if this is an error reply
    pub fn is_error(&self) -> bool {
        matches!(self, ServerReply::Error { .. })
    }

    /// Error code, if this is an error reply
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ServerReply::Error { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown component name on load
    UnsupportedType,
    /// Operation references an absent or unloaded component
    ComponentNotFound,
    /// Component has no method with that name
    MethodNotFound,
    /// Argument failed validation (wrong shape, out of range)
    InvalidArgument,
    /// A component with the requested id is already loaded
    ComponentExists,
    /// Component was destroyed while the command was in flight
    ComponentDestroyed,
    /// Line is not a valid command object
    InvalidRequest,
    /// `type` names no known command
    UnknownCommand,
    /// Anything else (buffer failures, watcher failures)
    InternalError,
}

impl ErrorCode {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedType => "UNSUPPORTED_TYPE",
            ErrorCode::ComponentNotFound => "COMPONENT_NOT_FOUND",
            ErrorCode::MethodNotFound => "METHOD_NOT_FOUND",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::ComponentExists => "COMPONENT_EXISTS",
            ErrorCode::ComponentDestroyed => "COMPONENT_DESTROYED",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::UnknownCommand => "UNKNOWN_COMMAND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Unified error types for the component runtime
//!
//! Declined actions (opening a disabled Select, focusing an index that does
//! not exist) are not errors: they come back as `Ok(false)`. Everything here
//! is a real failure the caller has to handle.

use thiserror::Error;
use widgetry_protocol::ErrorCode;

use crate::ports::BufferError;

/// Unified error type for component operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComponentError {
    /// Bad arguments (non-array options, wrong argument type, computed field write)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No component type registered under this name
    #[error("Unsupported component type: {0}")]
    UnsupportedType(String),

    /// No loaded component with this id
    #[error("Component not found: {0}")]
    NotFound(String),

    /// Method name not in the component's method table
    #[error("Method '{method}' not found on {component}")]
    MethodNotFound { component: String, method: String },

    /// Any operation on a destroyed instance
    #[error("Component {0} has been destroyed")]
    Destroyed(String),

    /// External buffer/window collaborator failed
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// A state watcher rejected a change
    #[error("Watcher for '{field}' failed: {message}")]
    Watcher { field: String, message: String },
}

impl ComponentError {
    /// Creates a validation error for bad caller input.
    ///
    /// # Example
    /// ```ignore
    /// if !options.is_array() {
    ///     return Err(ComponentError::validation("options must be an array"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a method-not-found error
    pub fn method_not_found(component: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            component: component.into(),
            method: method.into(),
        }
    }

    /// Create a watcher failure
    pub fn watcher(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Watcher {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the instance is gone
    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed(_))
    }

    /// Wire error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::InvalidArgument,
            Self::UnsupportedType(_) => ErrorCode::UnsupportedType,
            Self::NotFound(_) => ErrorCode::ComponentNotFound,
            Self::MethodNotFound { .. } => ErrorCode::MethodNotFound,
            Self::Destroyed(_) => ErrorCode::ComponentDestroyed,
            Self::Buffer(_) | Self::Watcher { .. } => ErrorCode::InternalError,
        }
    }
}

//! Port traits for the collaborators a component needs.
//!
//! These are the only abstractions in the domain:
//! - `BufferBackend`: the embedded runtime's buffer/window primitives
//! - `ComponentLink`: the way a component talks back to whoever hosts it
//!   (event notifications, message-bridge handler detachment)

use std::fmt;

use serde_json::Value;

// =============================================================================
// Buffer Backend
// =============================================================================

/// Opaque handle to an allocated buffer/window pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BufferError {
    #[error("Buffer not found: {0}")]
    NotFound(BufferHandle),
    #[error("Buffer backend error: {0}")]
    Backend(String),
}

/// Text buffer primitives of the embedded runtime.
#[cfg_attr(test, mockall::automock)]
pub trait BufferBackend: Send + Sync {
    /// Allocate a buffer and the window displaying it.
    fn create(&self, component_id: &str, title: &str) -> Result<BufferHandle, BufferError>;

    /// Replace the whole buffer content.
    fn set_lines(&self, handle: BufferHandle, lines: &[String]) -> Result<(), BufferError>;

    /// Close the window and wipe the buffer.
    fn close(&self, handle: BufferHandle) -> Result<(), BufferError>;
}

// =============================================================================
// Component Link
// =============================================================================

/// Lifecycle event names shared by every component type.
pub mod events {
    pub const MOUNTED: &str = "component:mounted";
    pub const DESTROYED: &str = "component:destroyed";
}

/// Notification emitted by a component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentEvent {
    pub component_id: String,
    pub action: String,
    pub payload: Value,
}

impl ComponentEvent {
    pub fn new(component_id: impl Into<String>, action: impl Into<String>, payload: Value) -> Self {
        Self {
            component_id: component_id.into(),
            action: action.into(),
            payload,
        }
    }
}

/// Back channel from a component to its host.
#[cfg_attr(test, mockall::automock)]
pub trait ComponentLink: Send + Sync {
    /// Publish an event. Must not block.
    fn emit(&self, event: ComponentEvent);

    /// Drop whatever inbound route the host keeps for this component.
    fn detach(&self, component_id: &str);
}

/// Link for components nobody listens to.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedLink;

impl ComponentLink for DetachedLink {
    fn emit(&self, _event: ComponentEvent) {}

    fn detach(&self, _component_id: &str) {}
}

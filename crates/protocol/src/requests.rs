//! Commands accepted by the remote command protocol server
//!
//! One JSON object per line. Every command carries a caller-chosen `id` that
//! the server echoes back on the reply line.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Client Command Enum
// =============================================================================

/// All commands a protocol client can send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Create and mount a component. Every field not listed here is a prop.
    LoadComponent {
        id: String,
        name: String,
        /// Fixed component id (generated when absent)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        component_id: Option<String>,
        /// Replace an existing component with the same id
        #[serde(default)]
        force: bool,
        #[serde(flatten)]
        props: Map<String, Value>,
    },

    /// Invoke a component method
    CallMethod {
        id: String,
        component_id: String,
        method: String,
        #[serde(default)]
        args: Vec<Value>,
    },

    /// Read a component state snapshot
    GetState { id: String, component_id: String },

    /// Patch component props. Kept as a raw value so a non-object can be
    /// reported as an invalid argument instead of a parse failure.
    SetProps {
        id: String,
        component_id: String,
        #[serde(default)]
        props: Value,
    },

    /// Destroy a component and drop it from the registry
    UnloadComponent { id: String, component_id: String },

    /// Liveness check
    Ping { id: String },

    /// Destroy every loaded component
    CleanAll { id: String },
}

impl ClientCommand {
    /// The request id to echo back.
    pub fn request_id(&self) -> &str {
        match self {
            ClientCommand::LoadComponent { id, .. }
            | ClientCommand::CallMethod { id, .. }
            | ClientCommand::GetState { id, .. }
            | ClientCommand::SetProps { id, .. }
            | ClientCommand::UnloadComponent { id, .. }
            | ClientCommand::Ping { id }
            | ClientCommand::CleanAll { id } => id,
        }
    }

    /// Command name as it appears in the `type` field.
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::LoadComponent { .. } => "load_component",
            ClientCommand::CallMethod { .. } => "call_method",
            ClientCommand::GetState { .. } => "get_state",
            ClientCommand::SetProps { .. } => "set_props",
            ClientCommand::UnloadComponent { .. } => "unload_component",
            ClientCommand::Ping { .. } => "ping",
            ClientCommand::CleanAll { .. } => "clean_all",
        }
    }

    /// All command names the server understands.
    pub const NAMES: [&'static str; 7] = [
        "load_component",
        "call_method",
        "get_state",
        "set_props",
        "unload_component",
        "ping",
        "clean_all",
    ];
}

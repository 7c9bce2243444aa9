//! Widgetry Protocol - Wire types shared by both runtimes and test drivers
//!
//! This crate contains every type that crosses a process or runtime boundary:
//! - The bridge envelope (`Message`) exchanged between the host runtime and
//!   the embedded runtime
//! - The socket command protocol (`ClientCommand` in, `ServerReply` out)
//! - Machine-readable error codes
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde and serde_json
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Line oriented** - Every type serializes to a single JSON line

pub mod messages;
pub mod requests;
pub mod responses;

// =============================================================================
// Bridge Envelope
// =============================================================================
pub use messages::{actions, Message, MessageType};

// =============================================================================
// Socket Protocol
// =============================================================================
pub use requests::ClientCommand;
pub use responses::{ErrorCode, ServerReply};

//! Widgetry Shared - the message bridge both runtimes speak.
//!
//! - [`MessageBridge`]: handler registry, pending calls, request timeouts
//! - [`transport`]: in-process channels and newline-delimited streams
//! - [`BridgeLink`]: two bridges wired back to back in one process

pub mod bridge;
pub mod error;
pub mod link;
pub mod pending;
pub mod transport;

pub use bridge::{handler_fn, BridgeConfig, MessageBridge, MessageHandler, DEFAULT_REQUEST_TIMEOUT};
pub use error::BridgeError;
pub use link::BridgeLink;
pub use pending::{DuplicateId, PendingCalls, PendingMap, PendingResult};
pub use transport::{run_line_reader, spawn_pump, ChannelTransport, LineTransport, MessageTransport};

//! Command Bus and Event Bus messaging infrastructure.
//!
//! - `CommandBus`: send protocol commands to the engine (fire-and-forget or request-response)
//! - `EventBus`: receive component events from the engine (push-based subscription)

pub mod command_bus;
pub mod event_bus;

pub use command_bus::{CommandBus, PendingRequests};
pub use event_bus::{EventBus, HostEvent};

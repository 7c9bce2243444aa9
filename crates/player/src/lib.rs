//! Widgetry Player - the host side of the component runtime.
//!
//! - [`ProtocolClient`]: line-delimited JSON client for the engine's command
//!   socket, with request/reply matching by id
//! - [`RemoteComponent`] / [`RemoteSelect`]: proxies that forward calls over a
//!   [`widgetry_shared::MessageBridge`] to a component owned by the engine
//! - [`EventBus`]: fan-out of component events to host subscribers

pub mod application;
pub mod error;
pub mod infrastructure;

pub use application::{RemoteComponent, RemoteSelect};
pub use error::{RemoteError, RequestError};
pub use infrastructure::{
    CommandBus, EventBus, HostEvent, LoadedComponent, ProtocolClient, DEFAULT_REQUEST_TIMEOUT,
};

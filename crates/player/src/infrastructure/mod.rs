//! Infrastructure: messaging buses and the protocol client.

pub mod messaging;
pub mod protocol_client;

pub use messaging::{CommandBus, EventBus, HostEvent, PendingRequests};
pub use protocol_client::{LoadedComponent, ProtocolClient, DEFAULT_REQUEST_TIMEOUT};

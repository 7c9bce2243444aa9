//! Two bridges joined in-process.

use std::sync::Arc;

use crate::bridge::{BridgeConfig, MessageBridge};
use crate::transport::{spawn_pump, ChannelTransport};

/// The host-side and engine-side bridges of one process pair.
#[derive(Debug, Clone)]
pub struct BridgeLink {
    pub host: Arc<MessageBridge>,
    pub engine: Arc<MessageBridge>,
}

impl BridgeLink {
    /// Wire two bridges back to back. Must be called inside a tokio runtime.
    ///
    /// The pump tasks stop once both bridges are dropped.
    pub fn pair(config: BridgeConfig) -> Self {
        let (to_engine, engine_rx) = ChannelTransport::new();
        let (to_host, host_rx) = ChannelTransport::new();

        let host = Arc::new(MessageBridge::new("host", Arc::new(to_engine), config.clone()));
        let engine = Arc::new(MessageBridge::new("engine", Arc::new(to_host), config));

        spawn_pump(Arc::downgrade(&host), host_rx);
        spawn_pump(Arc::downgrade(&engine), engine_rx);

        Self { host, engine }
    }
}

//! Application state and composition.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use widgetry_protocol::Message;
use widgetry_shared::{BridgeConfig, ChannelTransport, MessageBridge};

use crate::api::ConnectionManager;
use crate::infrastructure::bridge_link::EngineLink;
use crate::infrastructure::buffers::InMemoryBuffers;
use crate::infrastructure::config::EngineConfig;
use crate::use_cases::ComponentService;

/// Main application state.
///
/// Owns the component registry and the engine side of the message bridge.
/// Shared by every protocol connection.
pub struct App {
    pub config: EngineConfig,
    pub components: Arc<ComponentService>,
    pub buffers: Arc<InMemoryBuffers>,
    pub bridge: Arc<MessageBridge>,
    pub connections: Arc<ConnectionManager>,
}

impl App {
    /// Compose the engine around an existing bridge. Must be called inside a
    /// tokio runtime.
    pub fn new(config: EngineConfig, bridge: Arc<MessageBridge>) -> Self {
        let buffers = Arc::new(InMemoryBuffers::new());
        let (link, _forwarder) = EngineLink::spawn(Arc::clone(&bridge));
        let components = Arc::new(ComponentService::new(
            buffers.clone(),
            Arc::new(link),
            Arc::clone(&bridge),
        ));

        Self {
            config,
            components,
            buffers,
            bridge,
            connections: Arc::new(ConnectionManager::new()),
        }
    }

    /// Engine with no host attached: outbound bridge traffic is dropped.
    pub fn detached(config: EngineConfig) -> Self {
        let (transport, rx) = ChannelTransport::new();
        tokio::spawn(drain_unattached(rx));
        let bridge = Arc::new(MessageBridge::new(
            "engine",
            Arc::new(transport),
            BridgeConfig::with_timeout(config.bridge_timeout),
        ));
        Self::new(config, bridge)
    }

    /// Destroy every component and fail in-flight bridge requests.
    pub async fn shutdown(&self) -> usize {
        let cleaned = self.components.clean_all().await;
        let cancelled = self.bridge.cancel_pending().await;
        tracing::info!(components = cleaned, pending = cancelled, "Engine shut down");
        cleaned
    }
}

async fn drain_unattached(mut rx: UnboundedReceiver<Message>) {
    while let Some(message) = rx.recv().await {
        tracing::trace!(
            target_id = %message.id,
            action = %message.action,
            "No host attached, dropping bridge message"
        );
    }
}

//! Connection management for protocol clients.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

use tokio::sync::RwLock;
use widgetry_domain::ConnectionId;

/// Information about a connected client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    pub peer: SocketAddr,
    pub connected_at: Instant,
}

/// Tracks open protocol connections.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, ConnectionInfo>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection.
    pub async fn register(&self, connection_id: ConnectionId, peer: SocketAddr) {
        let info = ConnectionInfo {
            connection_id,
            peer,
            connected_at: Instant::now(),
        };
        self.connections.write().await.insert(connection_id, info);
        tracing::debug!(connection_id = %connection_id, peer = %peer, "Connection registered");
    }

    /// Unregister a connection.
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let removed = self.connections.write().await.remove(&connection_id);
        if let Some(info) = removed {
            tracing::debug!(
                connection_id = %connection_id,
                duration_ms = %info.connected_at.elapsed().as_millis(),
                "Connection unregistered"
            );
        }
    }

    pub async fn get(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        self.connections.read().await.get(&connection_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}

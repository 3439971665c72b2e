/// WebSocket connection registry for admin sessions
///
/// Every admin may hold several concurrent connections (tabs, devices).
/// Broadcasts go to every live connection; senders whose receiver was
/// dropped are pruned on the next write.
use super::WebSocketMessage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

pub type WebSocketSender = mpsc::UnboundedSender<WebSocketMessage>;

struct Connection {
    id: Uuid,
    sender: WebSocketSender,
}

#[derive(Clone, Default)]
pub struct ConnectionManager {
    /// admin_id -> open connections
    connections: Arc<RwLock<HashMap<Uuid, Vec<Connection>>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `admin_id`; returns the connection id
    pub async fn subscribe(&self, admin_id: Uuid, sender: WebSocketSender) -> Uuid {
        let id = Uuid::new_v4();
        let mut connections = self.connections.write().await;
        connections
            .entry(admin_id)
            .or_default()
            .push(Connection { id, sender });
        id
    }

    /// Remove a single connection, dropping the admin entry when it was the last
    pub async fn unsubscribe(&self, admin_id: Uuid, connection_id: Uuid) {
        let mut connections = self.connections.write().await;
        if let Some(list) = connections.get_mut(&admin_id) {
            list.retain(|conn| conn.id != connection_id);
            if list.is_empty() {
                connections.remove(&admin_id);
            }
        }
    }

    /// Send to every open connection; returns frames queued
    pub async fn broadcast(&self, message: WebSocketMessage) -> usize {
        let mut connections = self.connections.write().await;
        let mut delivered = 0;

        connections.retain(|_, list| {
            list.retain(|conn| !conn.sender.is_closed());
            for conn in list.iter() {
                if conn.sender.send(message.clone()).is_ok() {
                    delivered += 1;
                }
            }
            !list.is_empty()
        });

        delivered
    }

    pub async fn connection_count(&self, admin_id: Uuid) -> usize {
        let connections = self.connections.read().await;
        connections.get(&admin_id).map(|v| v.len()).unwrap_or(0)
    }

    pub async fn total_connections(&self) -> usize {
        let connections = self.connections.read().await;
        connections.values().map(|v| v.len()).sum()
    }

    pub async fn connected_admins_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

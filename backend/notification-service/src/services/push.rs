use async_trait::async_trait;

use crate::error::Result;
use crate::websocket::{ConnectionManager, WebSocketMessage};

/// Fire-and-forget broadcast to every connected listener
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Returns the number of listeners the event was queued for
    async fn broadcast(&self, event_name: &str, payload: serde_json::Value) -> Result<usize>;
}

#[async_trait]
impl Broadcaster for ConnectionManager {
    async fn broadcast(&self, event_name: &str, payload: serde_json::Value) -> Result<usize> {
        let message = WebSocketMessage::event(event_name, payload);
        let delivered = ConnectionManager::broadcast(self, message).await;
        tracing::debug!(event = event_name, delivered, "push broadcast queued");
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_connection_manager_broadcasts_named_event() {
        let manager = ConnectionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.subscribe(Uuid::new_v4(), tx).await;

        let payload = serde_json::json!({ "id": 1 });
        let delivered = Broadcaster::broadcast(&manager, "userUpdated", payload)
            .await
            .unwrap();

        assert_eq!(delivered, 1);
        match rx.try_recv().unwrap() {
            WebSocketMessage::Event { event, payload } => {
                assert_eq!(event, "userUpdated");
                assert_eq!(payload["id"], 1);
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, connection_id: String, sender: mpsc::UnboundedSender<String>);

    /// Drops the outbound sender, which ends that connection's session loop.
    async fn remove_connection(&self, connection_id: &str);

    /// Returns false if the connection is unknown or its receiver is gone.
    async fn send_to_connection(&self, connection_id: &str, message: &str) -> bool;
}

pub struct InMemoryConnectionManager {
    // connection id -> sender
    connections: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<String>>>>,
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, connection_id: String, sender: mpsc::UnboundedSender<String>) {
        debug!(connection_id = %connection_id, "Registering connection");
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, sender);
    }

    async fn remove_connection(&self, connection_id: &str) {
        let mut connections = self.connections.write().await;
        if connections.remove(connection_id).is_some() {
            debug!(connection_id = %connection_id, "Connection removed");
        }
    }

    async fn send_to_connection(&self, connection_id: &str, message: &str) -> bool {
        let connections = self.connections.read().await;
        match connections.get(connection_id) {
            Some(sender) => {
                if sender.send(message.to_string()).is_err() {
                    warn!(connection_id = %connection_id, "Outbound channel closed, dropping message");
                    return false;
                }
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_reaches_registered_connection() {
        let manager = InMemoryConnectionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.add_connection("c1".to_string(), tx).await;

        assert!(manager.send_to_connection("c1", "hello").await);
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
        assert!(!manager.send_to_connection("c2", "hello").await);
    }

    #[tokio::test]
    async fn test_remove_closes_the_channel() {
        let manager = InMemoryConnectionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.add_connection("c1".to_string(), tx).await;
        manager.remove_connection("c1").await;

        assert_eq!(manager.connection_count().await, 0);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_send_to_dropped_receiver_reports_failure() {
        let manager = InMemoryConnectionManager::new();
        let (tx, rx) = mpsc::unbounded_channel();
        manager.add_connection("c1".to_string(), tx).await;
        drop(rx);

        assert!(!manager.send_to_connection("c1", "hello").await);
    }
}

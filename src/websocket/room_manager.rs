use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::ALL_ASSETS;

/// A client's subscription information.
pub struct ClientSubscription {
    /// Subscribed asset ids, possibly including the `*` wildcard.
    pub assets: HashSet<String>,
    /// Channel to send messages to the client.
    pub tx: mpsc::UnboundedSender<String>,
}

/// Manages WebSocket client subscriptions to flip alerts.
#[derive(Default)]
pub struct RoomManager {
    /// Client subscriptions keyed by client ID.
    clients: DashMap<Uuid, ClientSubscription>,
    /// Asset rooms: asset id (or `*`) -> set of client IDs.
    rooms: DashMap<String, HashSet<Uuid>>,
}

fn normalize(asset: &str) -> String {
    asset.trim().to_uppercase()
}

impl RoomManager {
    /// Create a new room manager.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new client.
    pub fn register(&self, tx: mpsc::UnboundedSender<String>) -> Uuid {
        let client_id = Uuid::new_v4();
        self.clients.insert(
            client_id,
            ClientSubscription {
                assets: HashSet::new(),
                tx,
            },
        );
        client_id
    }

    /// Unregister a client and remove from all rooms.
    pub fn unregister(&self, client_id: Uuid) {
        if let Some((_, subscription)) = self.clients.remove(&client_id) {
            for asset in subscription.assets {
                if let Some(mut room) = self.rooms.get_mut(&asset) {
                    room.remove(&client_id);
                }
            }
        }
    }

    /// Subscribe a client to assets. Returns the newly added ids.
    pub fn subscribe(&self, client_id: Uuid, assets: &[String]) -> Vec<String> {
        let mut subscribed = Vec::new();

        if let Some(mut client) = self.clients.get_mut(&client_id) {
            for asset in assets {
                let asset = normalize(asset);
                if asset.is_empty() {
                    continue;
                }
                if client.assets.insert(asset.clone()) {
                    subscribed.push(asset.clone());
                    self.rooms
                        .entry(asset)
                        .or_insert_with(HashSet::new)
                        .insert(client_id);
                }
            }
        }

        subscribed
    }

    /// Unsubscribe a client from assets. Returns the removed ids.
    pub fn unsubscribe(&self, client_id: Uuid, assets: &[String]) -> Vec<String> {
        let mut unsubscribed = Vec::new();

        if let Some(mut client) = self.clients.get_mut(&client_id) {
            for asset in assets {
                let asset = normalize(asset);
                if client.assets.remove(&asset) {
                    if let Some(mut room) = self.rooms.get_mut(&asset) {
                        room.remove(&client_id);
                    }
                    unsubscribed.push(asset);
                }
            }
        }

        unsubscribed
    }

    /// Whether a client receives alerts for an asset.
    pub fn is_subscribed(&self, client_id: Uuid, asset: &str) -> bool {
        self.clients
            .get(&client_id)
            .map(|c| c.assets.contains(ALL_ASSETS) || c.assets.contains(&normalize(asset)))
            .unwrap_or(false)
    }

    /// Senders for every client subscribed to an asset directly or via `*`.
    pub fn get_subscribers(&self, asset: &str) -> Vec<mpsc::UnboundedSender<String>> {
        let mut client_ids: HashSet<Uuid> = HashSet::new();
        for room in [normalize(asset), ALL_ASSETS.to_string()] {
            if let Some(members) = self.rooms.get(&room) {
                client_ids.extend(members.iter().copied());
            }
        }

        client_ids
            .iter()
            .filter_map(|id| self.clients.get(id).map(|c| c.tx.clone()))
            .collect()
    }

    /// Broadcast a message to all clients subscribed to an asset.
    pub fn broadcast(&self, asset: &str, message: &str) -> usize {
        let senders = self.get_subscribers(asset);
        senders
            .iter()
            .filter(|tx| tx.send(message.to_string()).is_ok())
            .count()
    }

    /// Send a message to one client.
    pub fn send_to(&self, client_id: Uuid, message: String) {
        if let Some(client) = self.clients.get(&client_id) {
            let _ = client.tx.send(message);
        }
    }

    /// Get the number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Get the number of active rooms (assets with subscribers).
    pub fn room_count(&self) -> usize {
        self.rooms.iter().filter(|r| !r.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_normalizes_and_dedupes() {
        let manager = RoomManager::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = manager.register(tx);

        let added = manager.subscribe(id, &["btcusdt".to_string(), "BTCUSDT".to_string()]);
        assert_eq!(added, vec!["BTCUSDT".to_string()]);
        assert!(manager.is_subscribed(id, "btcusdt"));
        assert_eq!(manager.room_count(), 1);
    }

    #[test]
    fn test_broadcast_reaches_direct_and_wildcard() {
        let manager = RoomManager::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let (tx_c, mut rx_c) = mpsc::unbounded_channel();
        let a = manager.register(tx_a);
        let b = manager.register(tx_b);
        let c = manager.register(tx_c);

        manager.subscribe(a, &["BTCUSDT".to_string()]);
        manager.subscribe(b, &[ALL_ASSETS.to_string()]);
        manager.subscribe(c, &["ETHUSDT".to_string()]);

        assert_eq!(manager.broadcast("BTCUSDT", "hello"), 2);
        assert_eq!(rx_a.try_recv().unwrap(), "hello");
        assert_eq!(rx_b.try_recv().unwrap(), "hello");
        assert!(rx_c.try_recv().is_err());
    }

    #[test]
    fn test_wildcard_and_direct_delivered_once() {
        let manager = RoomManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = manager.register(tx);
        manager.subscribe(id, &["BTCUSDT".to_string(), ALL_ASSETS.to_string()]);

        assert_eq!(manager.broadcast("BTCUSDT", "once"), 1);
        assert_eq!(rx.try_recv().unwrap(), "once");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe_and_unregister() {
        let manager = RoomManager::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = manager.register(tx);
        manager.subscribe(id, &["BTCUSDT".to_string(), "ETHUSDT".to_string()]);

        let removed = manager.unsubscribe(id, &["ethusdt".to_string(), "SOLUSDT".to_string()]);
        assert_eq!(removed, vec!["ETHUSDT".to_string()]);
        assert!(!manager.is_subscribed(id, "ETHUSDT"));

        manager.unregister(id);
        assert_eq!(manager.client_count(), 0);
        assert_eq!(manager.room_count(), 0);
        assert_eq!(manager.broadcast("BTCUSDT", "gone"), 0);
    }
}

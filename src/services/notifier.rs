//! Flip event delivery.

use crate::types::{FlipEvent, FlipNotification, ServerMessage};
use crate::websocket::RoomManager;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Receives flip events produced by a cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &FlipEvent);
}

/// Writes every flip to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &FlipEvent) {
        info!(
            "FLIP {}: {} -> {} at {}",
            event.asset_id,
            event.from.label(),
            event.to.label(),
            event.reference_price
        );
    }
}

/// Keeps one pending notification per asset and pushes it to subscribers.
///
/// A newer flip for the same asset replaces the pending one (same tag).
pub struct FlipBroadcaster {
    pending: DashMap<String, FlipNotification>,
    room_manager: Arc<RoomManager>,
    /// Serializes publishing against subscribe-and-replay so a client sees
    /// each notification once, in order.
    gate: Mutex<()>,
}

impl FlipBroadcaster {
    pub fn new(room_manager: Arc<RoomManager>) -> Arc<Self> {
        Arc::new(Self {
            pending: DashMap::new(),
            room_manager,
            gate: Mutex::new(()),
        })
    }

    /// Subscribe a client, acknowledge, then replay the pending
    /// notifications it now covers. Returns the newly added asset ids.
    pub fn subscribe(&self, client_id: Uuid, assets: &[String]) -> Vec<String> {
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());

        let added = self.room_manager.subscribe(client_id, assets);
        self.send(
            client_id,
            &ServerMessage::Subscribed {
                assets: added.clone(),
            },
        );

        for data in self.pending() {
            if self.room_manager.is_subscribed(client_id, &data.asset_id) {
                self.send(client_id, &ServerMessage::Flip { data });
            }
        }

        added
    }

    fn send(&self, client_id: Uuid, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => self.room_manager.send_to(client_id, json),
            Err(e) => warn!("Could not encode message for {}: {}", client_id, e),
        }
    }

    fn publish(&self, event: &FlipEvent) {
        let notification = FlipNotification::from(event);
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(previous) = self
            .pending
            .insert(event.asset_id.clone(), notification.clone())
        {
            debug!(
                "Replaced pending notification {} for {}",
                previous.id, previous.asset_id
            );
        }

        let msg = ServerMessage::Flip { data: notification };
        match serde_json::to_string(&msg) {
            Ok(json) => {
                let delivered = self.room_manager.broadcast(&event.asset_id, &json);
                debug!("Pushed flip for {} to {} clients", event.asset_id, delivered);
            }
            Err(e) => warn!("Failed to serialize flip for {}: {}", event.asset_id, e),
        }
    }

    /// Pending notifications, newest first.
    pub fn pending(&self) -> Vec<FlipNotification> {
        let mut notifications: Vec<FlipNotification> =
            self.pending.iter().map(|n| n.value().clone()).collect();
        notifications.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.asset_id.cmp(&b.asset_id))
        });
        notifications
    }

    pub fn pending_for(&self, asset_id: &str) -> Option<FlipNotification> {
        self.pending
            .get(&asset_id.to_uppercase())
            .map(|n| n.value().clone())
    }

    /// Drop an asset's pending notification.
    pub fn dismiss(&self, asset_id: &str) -> Option<FlipNotification> {
        self.pending
            .remove(&asset_id.to_uppercase())
            .map(|(_, n)| n)
    }
}

#[async_trait]
impl Notifier for FlipBroadcaster {
    async fn notify(&self, event: &FlipEvent) {
        self.publish(event);
    }
}

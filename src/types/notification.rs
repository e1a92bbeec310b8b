//! Flip notification types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Confidence, FlipEvent};

/// A user-facing alert built from a flip event.
///
/// `tag` is stable per asset so a consumer replaces a still-pending alert
/// instead of stacking a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipNotification {
    /// Unique notification ID
    pub id: Uuid,
    /// Collapse key, `flip:{asset_id}`
    pub tag: String,
    pub asset_id: String,
    /// Short title
    pub title: String,
    /// Longer message
    pub message: String,
    pub from: Confidence,
    pub to: Confidence,
    pub reference_price: f64,
    /// Timestamp in milliseconds
    pub timestamp: i64,
}

impl FlipNotification {
    /// Collapse key for an asset.
    pub fn tag_for(asset_id: &str) -> String {
        format!("flip:{}", asset_id)
    }
}

impl From<&FlipEvent> for FlipNotification {
    fn from(event: &FlipEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag: Self::tag_for(&event.asset_id),
            asset_id: event.asset_id.clone(),
            title: format!("{} flipped {}", event.asset_id, event.to.label()),
            message: format!(
                "{} moved from {} to {} at {}",
                event.asset_id,
                event.from.label(),
                event.to.label(),
                event.reference_price
            ),
            from: event.from,
            to: event.to,
            reference_price: event.reference_price,
            timestamp: event.timestamp,
        }
    }
}

use super::FlipNotification;
use serde::{Deserialize, Serialize};

/// Wildcard asset subscription.
pub const ALL_ASSETS: &str = "*";

/// Incoming WebSocket message from client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { assets: Vec<String> },
    Unsubscribe { assets: Vec<String> },
}

/// Outgoing WebSocket message to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Flip { data: FlipNotification },
    Subscribed { assets: Vec<String> },
    Unsubscribed { assets: Vec<String> },
    Error { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confidence, FlipEvent};

    #[test]
    fn test_client_subscribe_deserialization() {
        let json = r#"{"type":"subscribe","assets":["BTCUSDT","*"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { assets } => {
                assert_eq!(assets, vec!["BTCUSDT".to_string(), ALL_ASSETS.to_string()]);
            }
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_unknown_type_rejected() {
        let json = r#"{"type":"set_throttle","throttle_ms":10}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_server_flip_serialization() {
        let event = FlipEvent {
            asset_id: "ETHUSDT".to_string(),
            from: Confidence::Neutral,
            to: Confidence::ConfirmedBearish,
            reference_price: 2300.0,
            timestamp: 1,
        };
        let msg = ServerMessage::Flip {
            data: FlipNotification::from(&event),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"flip\""));
        assert!(json.contains("\"tag\":\"flip:ETHUSDT\""));
    }

    #[test]
    fn test_server_error_serialization() {
        let msg = ServerMessage::Error {
            error: "bad".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"error","error":"bad"}"#);
    }
}

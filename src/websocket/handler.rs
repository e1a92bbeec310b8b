use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{ClientMessage, ServerMessage};
use crate::AppState;

/// WebSocket upgrade handler for flip pushes.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| flip_session(socket, state))
}

/// One client session: queued pushes go out, subscription requests come in,
/// until either side closes.
async fn flip_session(socket: WebSocket, state: AppState) {
    let (mut outbound, mut inbound) = socket.split();
    let (tx, mut queue) = mpsc::unbounded_channel::<String>();
    let client_id = state.room_manager.register(tx);
    info!("Flip subscriber connected: {}", client_id);

    loop {
        tokio::select! {
            queued = queue.recv() => {
                let Some(json) = queued else { break };
                if outbound.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            incoming = inbound.next() => match incoming {
                Some(Ok(Message::Text(text))) => handle_message(&state, client_id, &text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Flip subscriber {} socket error: {}", client_id, e);
                    break;
                }
            },
        }
    }

    state.room_manager.unregister(client_id);
    info!("Flip subscriber disconnected: {}", client_id);
}

/// Apply one client message and queue the replies for that client.
///
/// Subscribing replays any pending flips the client now covers so late
/// joiners see unresolved alerts.
pub fn handle_message(state: &AppState, client_id: Uuid, text: &str) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Subscribe { assets }) => {
            let assets = state.broadcaster.subscribe(client_id, &assets);
            debug!("{} watching {:?}", client_id, assets);
            return;
        }
        Ok(ClientMessage::Unsubscribe { assets }) => {
            let assets = state.room_manager.unsubscribe(client_id, &assets);
            debug!("{} dropped {:?}", client_id, assets);
            ServerMessage::Unsubscribed { assets }
        }
        Err(e) => ServerMessage::Error {
            error: format!("Invalid message: {}", e),
        },
    };

    match serde_json::to_string(&reply) {
        Ok(json) => state.room_manager.send_to(client_id, json),
        Err(e) => warn!("Could not encode reply for {}: {}", client_id, e),
    }
}

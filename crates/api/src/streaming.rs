//! WebSocket streaming API.
//!
//! Clients connect to `/streaming?i=<token>` and then join booking channels:
//!
//! ```json
//! {"type": "connect", "body": {"channel": "booking", "id": "c1", "params": {"bookingId": "..."}}}
//! ```
//!
//! Events of that booking arrive as `channel` messages tagged with the
//! connection id the client chose.

use std::collections::HashMap;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use terapie_core::BookingEvent;
use terapie_db::entities::user;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::middleware::AppState;
use crate::sse::event_name;

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token for authentication.
    #[serde(rename = "i")]
    pub token: Option<String>,
}

/// Client-to-server message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Join a channel.
    Connect {
        channel: String,
        id: String,
        #[serde(default)]
        params: serde_json::Value,
    },
    /// Leave a channel.
    Disconnect { id: String },
}

/// Server-to-client message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Channel joined.
    Connected { id: String },
    /// Event on a joined channel.
    Channel {
        id: String,
        #[serde(rename = "type")]
        event_type: String,
        body: serde_json::Value,
    },
    /// A request could not be honoured.
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        message: String,
    },
}

impl ServerMessage {
    fn error(id: Option<String>, message: impl Into<String>) -> Self {
        Self::Error {
            id,
            message: message.into(),
        }
    }

    fn from_event(id: &str, event: &BookingEvent) -> Self {
        // The event serializes as {"type", "body"}; only the body is forwarded.
        let body = serde_json::to_value(event)
            .ok()
            .and_then(|mut value| value.get_mut("body").map(serde_json::Value::take))
            .unwrap_or_default();
        Self::Channel {
            id: id.to_string(),
            event_type: event_name(event).to_string(),
            body,
        }
    }
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

async fn authenticate(state: &AppState, query: &StreamQuery) -> Option<user::Model> {
    let token = query.token.as_deref().filter(|t| !t.is_empty())?;
    match state.account_service.authenticate_by_token(token).await {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(error = %e, "Streaming auth failed");
            None
        }
    }
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, query: StreamQuery, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let Some(user) = authenticate(&state, &query).await else {
        let msg = ServerMessage::error(None, "Authentication required");
        let json = serde_json::to_string(&msg).unwrap_or_default();
        let _ = sender.send(Message::Text(json.into())).await;
        let _ = sender.close().await;
        return;
    };

    info!(user = %user.id, "Streaming connection established");

    // Channel forwarders push into this queue; the loop below drains it.
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(64);
    let mut channels: HashMap<String, JoinHandle<()>> = HashMap::new();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(incoming) = incoming else { break };
                match incoming {
                    Ok(Message::Text(text)) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => handle_client_message(msg, &state, &user, &mut channels, &out_tx).await,
                            Err(e) => {
                                debug!(error = %e, "Unparseable client message");
                                Some(ServerMessage::error(None, "Invalid message"))
                            }
                        };
                        if let Some(reply) = reply {
                            let json = serde_json::to_string(&reply).unwrap_or_default();
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            Some(outgoing) = out_rx.recv() => {
                let json = serde_json::to_string(&outgoing).unwrap_or_default();
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    for (_, task) in channels.drain() {
        task.abort();
    }
    info!(user = %user.id, "Streaming connection closed");
}

async fn handle_client_message(
    msg: ClientMessage,
    state: &AppState,
    user: &user::Model,
    channels: &mut HashMap<String, JoinHandle<()>>,
    out_tx: &mpsc::Sender<ServerMessage>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Connect {
            channel,
            id,
            params,
        } => {
            if channel != "booking" {
                return Some(ServerMessage::error(Some(id), format!("Unknown channel: {channel}")));
            }
            let Some(booking_id) = params.get("bookingId").and_then(serde_json::Value::as_str)
            else {
                return Some(ServerMessage::error(Some(id), "bookingId is required"));
            };

            // Only participants may listen.
            let booking = match state.booking_service.get_for_participant(user, booking_id).await {
                Ok((booking, _)) => booking,
                Err(e) => return Some(ServerMessage::error(Some(id), e.to_string())),
            };

            let mut subscription = state.booking_hub.subscribe(&booking.id);
            let tx = out_tx.clone();
            let conn_id = id.clone();
            let task = tokio::spawn(async move {
                while let Some(event) = subscription.recv().await {
                    if tx.send(ServerMessage::from_event(&conn_id, &event)).await.is_err() {
                        break;
                    }
                }
            });

            if let Some(previous) = channels.insert(id.clone(), task) {
                previous.abort();
            }
            info!(user = %user.id, booking = %booking.id, id = %id, "Booking channel connected");
            Some(ServerMessage::Connected { id })
        }
        ClientMessage::Disconnect { id } => {
            if let Some(task) = channels.remove(&id) {
                task.abort();
                debug!(id = %id, "Channel disconnected");
            }
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use terapie_db::entities::booking::BookingStatus;

    #[test]
    fn test_parse_connect_message() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"connect","body":{"channel":"booking","id":"c1","params":{"bookingId":"b1"}}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Connect { channel, id, params } => {
                assert_eq!(channel, "booking");
                assert_eq!(id, "c1");
                assert_eq!(params["bookingId"], "b1");
            }
            ClientMessage::Disconnect { .. } => panic!("Expected Connect"),
        }
    }

    #[test]
    fn test_channel_message_carries_event_body() {
        let event = BookingEvent::StatusChanged {
            status: BookingStatus::Confirmed,
            notes: Some("ok".to_string()),
        };
        let value = serde_json::to_value(ServerMessage::from_event("c1", &event)).unwrap();

        assert_eq!(value["type"], "channel");
        assert_eq!(value["body"]["id"], "c1");
        assert_eq!(value["body"]["type"], "statusChanged");
        assert_eq!(value["body"]["body"]["status"], "confirmed");
        assert_eq!(value["body"]["body"]["notes"], "ok");
    }

    #[test]
    fn test_error_message_shape() {
        let value = serde_json::to_value(ServerMessage::error(None, "nope")).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["body"]["message"], "nope");
        assert!(value["body"].get("id").is_none());
    }
}

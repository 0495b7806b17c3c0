//! WebSocket endpoint for real-time note events
//!
//! Connections are not authenticated: every client receives every note event.

use crate::bus::{ClientMessage, NotificationBus, ServerMessage};
use crate::server::app::AppState;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.bus))
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &ServerMessage,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(frame)?;
    sender.send(Message::Text(text.into())).await?;
    Ok(())
}

async fn handle_socket(socket: WebSocket, bus: NotificationBus) {
    let (mut sender, mut receiver) = socket.split();

    let mut subscription = bus.subscribe();
    let conn_id = subscription.id();

    let hello = ServerMessage::Connected {
        connection_id: conn_id,
    };
    if send_frame(&mut sender, &hello).await.is_err() {
        return;
    }

    info!(conn_id = %conn_id, "WebSocket client connected");

    // Replies to this client only (pongs), merged with bus events by the send task
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(16);

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = subscription.recv() => {
                    if sender.send(Message::Text(event.payload.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Some(reply) = reply_rx.recv() => {
                    if send_frame(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => handle_client_message(text.as_str(), &reply_tx),
            Ok(Message::Binary(data)) => {
                // Non-UTF-8 payloads fall through to the unsupported-message reply
                handle_client_message(std::str::from_utf8(&data).unwrap_or_default(), &reply_tx)
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Handled automatically by axum
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    debug!(conn_id = %conn_id, "WebSocket client disconnected");
    send_task.abort();
    bus.unsubscribe(conn_id);
}

fn handle_client_message(text: &str, replies: &mpsc::Sender<ServerMessage>) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping { seq }) => ServerMessage::Pong { seq },
        Err(e) => {
            debug!(error = %e, "Unsupported client message");
            ServerMessage::Error {
                message: "unsupported message".to_string(),
            }
        }
    };

    if let Err(e) = replies.try_send(reply) {
        debug!(error = %e, "Dropping reply to client");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_gets_pong() {
        let (tx, mut rx) = mpsc::channel(4);
        handle_client_message(r#"{"type":"ping","seq":5}"#, &tx);
        assert_eq!(rx.try_recv().unwrap(), ServerMessage::Pong { seq: 5 });
    }

    #[test]
    fn test_unknown_frame_gets_error_reply() {
        let (tx, mut rx) = mpsc::channel(4);
        handle_client_message("not json", &tx);
        handle_client_message(r#"{"type":"subscribe"}"#, &tx);

        for _ in 0..2 {
            assert!(matches!(rx.try_recv().unwrap(), ServerMessage::Error { .. }));
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_reply_queue_drops_reply() {
        let (tx, mut rx) = mpsc::channel(1);
        handle_client_message(r#"{"type":"ping","seq":1}"#, &tx);
        handle_client_message(r#"{"type":"ping","seq":2}"#, &tx);

        assert_eq!(rx.try_recv().unwrap(), ServerMessage::Pong { seq: 1 });
        assert!(rx.try_recv().is_err());
    }
}

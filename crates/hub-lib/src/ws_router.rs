// ============================
// crates/hub-lib/src/ws_router.rs
// ============================
//! WebSocket router and connection handling.
//!
//! The transport adapter: one task pair per connection, a writer draining
//! the hub's outbound channel into the socket and a read loop decoding
//! client events into hub calls. Everything stateful belongs to the hub;
//! this layer only frames, decodes, and tears down.
use crate::metrics as keys;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use palaver_common::{ClientMessage, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe
async fn healthz() -> &'static str {
    "ok"
}

/// Handler for WebSocket connections
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    counter!(keys::WS_CONNECTION).increment(1);
    gauge!(keys::WS_ACTIVE).increment(1.0);

    // Upgrade the connection to a WebSocket
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    // Connection ids are transport-assigned and opaque to clients
    let conn_id = Uuid::new_v4().to_string();
    let (mut sink, mut stream) = socket.split();

    // Channel the hub writes outbound events into
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Writer task: serialize ServerMessages onto the socket
    let send_task = tokio::spawn(async move {
        while let Some(server_msg) = rx.recv().await {
            let json = match serde_json::to_string(&server_msg) {
                Ok(json) => json,
                Err(err) => {
                    debug!(%err, "failed to serialize outbound event");
                    continue;
                },
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    state.hub.connect(&conn_id, tx.clone());

    // Read loop: decode client events and feed the hub
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    if let Some(ack) = state.hub.handle_message(&conn_id, client_msg) {
                        if tx.send(ack).is_err() {
                            break;
                        }
                    }
                },
                Err(err) => {
                    let _ = tx.send(ServerMessage::MalformedMessage {
                        err_msg: err.to_string(),
                    });
                },
            },
            Message::Close(_) => break,
            // ping/pong are answered by axum; binary frames are ignored
            _ => {},
        }
    }

    // Same teardown whether the close was orderly or the socket dropped
    state.hub.disconnect(&conn_id);

    counter!(keys::WS_DISCONNECTION).increment(1);
    gauge!(keys::WS_ACTIVE).decrement(1.0);

    // Let the writer drain whatever was queued before the close
    drop(tx);
    let _ = send_task.await;
}

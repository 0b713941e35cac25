use crate::server::Server;
use crate::signaling::ConnectionState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use geocast_core::{ConnectionId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(server): State<Arc<Server>>,
) -> impl IntoResponse {
    let connection_id = ConnectionId::new();
    ws.on_upgrade(move |socket| handle_socket(socket, connection_id, server))
}

async fn handle_socket(socket: WebSocket, connection_id: ConnectionId, server: Arc<Server>) {
    info!("New connection [{connection_id}]");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    server.service.add_connection(connection_id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let server = Arc::clone(&server);
        let mut conn = ConnectionState::new(connection_id.clone());

        async move {
            // messages of one connection are handled strictly in arrival
            // order; each connection is its own task
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => server.relay.handle_message(&mut conn, signal).await,
                        Err(e) => warn!("Invalid SignalMessage from [{}]: {e:?}", conn.id),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            server.relay.disconnect(&conn.id);
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    server.service.remove_connection(&connection_id);
    info!("Connection [{connection_id}] signaling disconnected");
}

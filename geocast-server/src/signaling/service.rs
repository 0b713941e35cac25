use crate::signaling::RelayOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use geocast_core::{ConnectionId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

/// Fan-out table from connection ids to their WebSocket send tasks.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
            }),
        }
    }

    pub fn add_connection(&self, id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(id, tx);
    }

    pub fn remove_connection(&self, id: &ConnectionId) {
        self.inner.connections.remove(id);
    }

    pub fn send_signal(&self, id: &ConnectionId, msg: SignalMessage) {
        if let Some(conn) = self.inner.connections.get(id) {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = conn.send(Message::Text(json.into())) {
                        error!("Failed to send WS message to [{id}]: {e:?}");
                    }
                }
                Err(e) => error!("Failed to serialize signal message: {e}"),
            }
        } else {
            warn!("Attempted to send signal to disconnected connection [{id}]");
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayOutput for SignalingService {
    async fn send(&self, connection_id: &ConnectionId, msg: SignalMessage) {
        self.send_signal(connection_id, msg);
    }
}

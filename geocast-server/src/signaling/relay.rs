use crate::error::RelayError;
use crate::media::SourceTable;
use crate::recording::RecordingRegistry;
use crate::signaling::rooms::{JoinOutcome, RoomTable};
use crate::signaling::RelayOutput;
use dashmap::DashMap;
use geocast_core::{ConnectionId, RoomId, SignalMessage, SourceId};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-connection state held by the transport task. Created on connection
/// establishment, dropped on disconnect, never persisted.
#[derive(Debug)]
pub struct ConnectionState {
    pub id: ConnectionId,
    pub is_mobile: bool,
}

impl ConnectionState {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            is_mobile: false,
        }
    }
}

/// Routes one connection's inbound messages to the matching action and
/// emits the result back over the signaling output.
///
/// Each transport task calls `handle_message` sequentially, which gives
/// the per-connection ordering guarantee; state shared across connections
/// (rooms, pending offers, sources, recordings) lives in concurrent maps.
pub struct SignalingRelay {
    output: Arc<dyn RelayOutput>,
    rooms: RoomTable,
    /// Answering connection → the connection whose offer it received.
    pending_offers: DashMap<ConnectionId, ConnectionId>,
    sources: Arc<SourceTable>,
    registry: Arc<RecordingRegistry>,
}

impl SignalingRelay {
    pub fn new(
        output: Arc<dyn RelayOutput>,
        sources: Arc<SourceTable>,
        registry: Arc<RecordingRegistry>,
    ) -> Self {
        Self {
            output,
            rooms: RoomTable::new(),
            pending_offers: DashMap::new(),
            sources,
            registry,
        }
    }

    pub async fn handle_message(&self, conn: &mut ConnectionState, msg: SignalMessage) {
        match msg {
            SignalMessage::Init { is_mobile } => {
                conn.is_mobile = is_mobile;
            }
            SignalMessage::Join { room, sdp } => {
                self.handle_join(conn, room, sdp).await;
            }
            SignalMessage::Answer { sdp } => {
                if let Err(e) = self.handle_answer(conn, sdp).await {
                    self.send_error(conn, e).await;
                }
            }
            SignalMessage::Record => match self.handle_record(conn).await {
                Ok(source_id) => {
                    self.output
                        .send(&conn.id, SignalMessage::Recording { source_id })
                        .await;
                }
                Err(e) => self.send_error(conn, e).await,
            },
            SignalMessage::Quit => {
                self.release(&conn.id);
            }
            other => {
                warn!("Connection [{}] sent unexpected message: {other:?}", conn.id);
            }
        }
    }

    /// Transport-level disconnect: same resource release as `quit`.
    pub fn disconnect(&self, conn_id: &ConnectionId) {
        self.release(conn_id);
    }

    async fn handle_join(&self, conn: &ConnectionState, room: RoomId, sdp: String) {
        match self.rooms.join(&room, conn.id.clone(), conn.is_mobile) {
            JoinOutcome::PeerAvailable { peer } => {
                self.pending_offers.insert(peer.clone(), conn.id.clone());
                self.output.send(&peer, SignalMessage::Offer { sdp }).await;
            }
            JoinOutcome::Created { codecs } => {
                self.output
                    .send(&conn.id, SignalMessage::RoomCreated { room, codecs })
                    .await;
            }
        }
    }

    async fn handle_answer(&self, conn: &ConnectionState, sdp: String) -> Result<(), RelayError> {
        let (_, offerer) = self
            .pending_offers
            .remove(&conn.id)
            .ok_or(RelayError::NoPendingOffer)?;
        self.output
            .send(&offerer, SignalMessage::Answer { sdp })
            .await;
        Ok(())
    }

    async fn handle_record(&self, conn: &ConnectionState) -> Result<SourceId, RelayError> {
        let source = self
            .sources
            .source_for_connection(&conn.id)
            .ok_or(RelayError::SourceUnavailable)?;
        if !source.enabled {
            return Err(RelayError::SourceDisabled);
        }

        let session = self.registry.start_recording(&source).await?;
        info!("Connection [{}] recording source [{}]", conn.id, source.id);
        Ok(session.id().clone())
    }

    fn release(&self, conn_id: &ConnectionId) {
        self.rooms.leave(conn_id);
        self.pending_offers.remove(conn_id);
        // also forget any offer this connection still owed an answer for
        self.pending_offers.retain(|_, offerer| offerer != conn_id);
    }

    async fn send_error(&self, conn: &ConnectionState, err: RelayError) {
        warn!("Connection [{}] request failed: {err}", conn.id);
        self.output
            .send(
                &conn.id,
                SignalMessage::Error {
                    message: err.to_string(),
                },
            )
            .await;
    }
}

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use geocast_core::{CodecPreference, ConnectionId, RoomId};
use tracing::info;

struct RoomState {
    members: Vec<ConnectionId>,
    codecs: Vec<CodecPreference>,
}

/// Result of attaching a connection to a room.
pub enum JoinOutcome {
    /// The room did not exist (or had no other peer); the caller gets the
    /// room's codec configuration back.
    Created { codecs: Vec<CodecPreference> },
    /// Another peer is already present; the caller's offer should be
    /// relayed to it.
    PeerAvailable { peer: ConnectionId },
}

/// Room membership table. Codec preferences are fixed at room creation
/// from the creating connection's capability flag.
pub struct RoomTable {
    rooms: DashMap<RoomId, RoomState>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    pub fn join(&self, room: &RoomId, conn: ConnectionId, is_mobile: bool) -> JoinOutcome {
        match self.rooms.entry(room.clone()) {
            Entry::Occupied(mut entry) => {
                let peer = entry
                    .get()
                    .members
                    .iter()
                    .find(|member| **member != conn)
                    .cloned();
                if !entry.get().members.contains(&conn) {
                    entry.get_mut().members.push(conn);
                }
                match peer {
                    Some(peer) => JoinOutcome::PeerAvailable { peer },
                    None => JoinOutcome::Created {
                        codecs: entry.get().codecs.clone(),
                    },
                }
            }
            Entry::Vacant(entry) => {
                info!("Creating new room [{room}]");
                let codecs = CodecPreference::for_capability(is_mobile);
                entry.insert(RoomState {
                    members: vec![conn],
                    codecs: codecs.clone(),
                });
                JoinOutcome::Created { codecs }
            }
        }
    }

    /// Drops the connection from every room; empty rooms go away with it.
    pub fn leave(&self, conn: &ConnectionId) {
        self.rooms.retain(|_, state| {
            state.members.retain(|member| member != conn);
            !state.members.is_empty()
        });
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomTable {
    fn default() -> Self {
        Self::new()
    }
}

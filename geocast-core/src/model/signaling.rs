use crate::model::codec::CodecPreference;
use crate::model::ids::{RoomId, SourceId};
use serde::{Deserialize, Serialize};

/// Logical signaling surface exchanged over one WebSocket connection.
///
/// `Init`, `Join`, `Answer`, `Record` and `Quit` flow client → server;
/// `Offer`, `Answer`, `RoomCreated`, `Recording` and `Error` flow
/// server → client. `Answer` appears in both directions: a client answers
/// an offer that was relayed to it, and the server relays that answer back
/// to the offering connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum SignalMessage {
    Init {
        is_mobile: bool,
    },
    Join {
        room: RoomId,
        sdp: String,
    },
    Offer {
        sdp: String,
    },
    Answer {
        sdp: String,
    },
    Record,
    Recording {
        source_id: SourceId,
    },
    RoomCreated {
        room: RoomId,
        codecs: Vec<CodecPreference>,
    },
    Quit,
    Error {
        message: String,
    },
}

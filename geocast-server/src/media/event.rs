use geocast_core::{ConnectionId, SourceId};

/// Notifications arriving from the external media relay engine.
///
/// The engine itself (ICE/DTLS/SRTP, RTP routing, the RTSP endpoint) lives
/// outside this process; it feeds these events into the server's event
/// loop over an mpsc channel.
#[derive(Debug)]
pub enum RelayEvent {
    NewConnection(ConnectionId),
    NewSource {
        source_id: SourceId,
        connection_id: ConnectionId,
    },
    SourceEnabled(SourceId),
    ConnectionClosed(ConnectionId),
}

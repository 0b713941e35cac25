use async_trait::async_trait;
use geocast_core::{ConnectionId, SignalMessage};

/// Outbound half of the signaling surface: whatever transport hosts the
/// connections (WebSocket in production, a capture buffer in tests)
/// implements this so the relay can emit results and errors.
#[async_trait]
pub trait RelayOutput: Send + Sync {
    async fn send(&self, connection_id: &ConnectionId, msg: SignalMessage);
}

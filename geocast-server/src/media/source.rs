use dashmap::DashMap;
use geocast_core::{ConnectionId, SourceId};
use tracing::{info, warn};

/// A media source announced by the relay engine, eligible for recording
/// once enabled.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub id: SourceId,
    pub connection_id: ConnectionId,
    /// RTSP locator the streaming process reads from.
    pub locator: String,
    pub enabled: bool,
}

/// Live view of the relay engine's sources, updated from `RelayEvent`s.
pub struct SourceTable {
    sources: DashMap<SourceId, SourceInfo>,
    rtsp_port: u16,
}

impl SourceTable {
    pub fn new(rtsp_port: u16) -> Self {
        Self {
            sources: DashMap::new(),
            rtsp_port,
        }
    }

    pub fn on_new_source(&self, id: SourceId, connection_id: ConnectionId) {
        let locator = format!("rtsp://127.0.0.1:{}/{}.sdp", self.rtsp_port, id);
        info!("New source [{id}] at {locator}");
        self.sources.insert(
            id.clone(),
            SourceInfo {
                id,
                connection_id,
                locator,
                enabled: false,
            },
        );
    }

    pub fn on_source_enabled(&self, id: &SourceId) {
        match self.sources.get_mut(id) {
            Some(mut source) => source.enabled = true,
            None => warn!("Enable event for unknown source [{id}]"),
        }
    }

    pub fn get(&self, id: &SourceId) -> Option<SourceInfo> {
        self.sources.get(id).map(|s| s.clone())
    }

    pub fn source_for_connection(&self, connection_id: &ConnectionId) -> Option<SourceInfo> {
        self.sources
            .iter()
            .find(|entry| &entry.connection_id == connection_id)
            .map(|entry| entry.clone())
    }

    pub fn remove_for_connection(&self, connection_id: &ConnectionId) {
        self.sources
            .retain(|_, source| &source.connection_id != connection_id);
    }
}

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server configuration. Every field has a default so a bare
/// `ServerConfig::default()` runs a local instance; a JSON file given on
/// the command line overrides individual fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    pub bind_addr: String,
    /// Directory recording files and streamer logs are written to.
    pub recordings_dir: PathBuf,
    /// SQLite database holding the marker table.
    pub database_url: String,
    /// Port of the relay engine's RTSP endpoint, used to derive source
    /// locators.
    pub rtsp_port: u16,
    /// Age in milliseconds after which a recording session is stale.
    pub session_stale_after_ms: u64,
    /// Reaper tick interval in milliseconds.
    pub reap_interval_ms: u64,
    /// Persisted markers older than this are purged on each tick.
    pub marker_retention_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8125".to_string(),
            recordings_dir: PathBuf::from("recordings"),
            database_url: "sqlite://db/db.sqlite".to_string(),
            rtsp_port: 5000,
            session_stale_after_ms: 300_000,
            reap_interval_ms: 300_000,
            marker_retention_ms: 1000 * 60 * 60 * 12,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn session_stale_after(&self) -> Duration {
        Duration::from_millis(self.session_stale_after_ms)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_millis(self.reap_interval_ms)
    }

    pub fn marker_retention(&self) -> Duration {
        Duration::from_millis(self.marker_retention_ms)
    }
}

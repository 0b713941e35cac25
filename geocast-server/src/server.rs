use crate::config::ServerConfig;
use crate::error::RelayError;
use crate::http;
use crate::media::{RelayEvent, SourceTable};
use crate::platform::{EntryMetadata, MediaPlatform, NullPlatform, bind_recording_upload};
use crate::recording::{FfmpegStreamer, Reaper, RecordingRegistry, Streamer};
use crate::signaling::{RelayOutput, SignalingRelay, SignalingService, ws_handler};
use crate::store::{MarkerStore, SqliteMarkerStore};
use axum::Router;
use axum::routing::{get, post};
use geocast_core::{Marker, MarkerDraft};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

/// Holds every piece of controller state: the recording registry, the
/// source and room tables, the store and platform boundaries, and the
/// reaper task. Constructed once at startup, torn down through
/// `shutdown`; nothing here is a process-wide global.
pub struct Server {
    pub config: ServerConfig,
    pub registry: Arc<RecordingRegistry>,
    pub sources: Arc<SourceTable>,
    pub store: Arc<dyn MarkerStore>,
    pub platform: Arc<dyn MediaPlatform>,
    pub service: SignalingService,
    pub relay: Arc<SignalingRelay>,
    shutdown_tx: watch::Sender<bool>,
    reaper_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        std::fs::create_dir_all(&config.recordings_dir)?;
        // create_if_missing covers the file, not its directory
        if let Some(path) = config.database_url.strip_prefix("sqlite://") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        let store = Arc::new(SqliteMarkerStore::connect(&config.database_url).await?);
        Ok(Self::with_parts(
            config,
            store,
            Arc::new(NullPlatform),
            Arc::new(FfmpegStreamer::new()),
        ))
    }

    /// Assembles a server from explicit collaborators. Tests plug mock
    /// streamers, stores and platforms in here.
    pub fn with_parts(
        config: ServerConfig,
        store: Arc<dyn MarkerStore>,
        platform: Arc<dyn MediaPlatform>,
        streamer: Arc<dyn Streamer>,
    ) -> Arc<Self> {
        let registry = Arc::new(RecordingRegistry::new(
            streamer,
            config.recordings_dir.clone(),
            config.session_stale_after(),
        ));
        let sources = Arc::new(SourceTable::new(config.rtsp_port));
        let service = SignalingService::new();
        let relay = Arc::new(SignalingRelay::new(
            Arc::new(service.clone()) as Arc<dyn RelayOutput>,
            Arc::clone(&sources),
            Arc::clone(&registry),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reaper = Reaper::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            config.reap_interval(),
            config.marker_retention(),
        );
        let reaper_handle = tokio::spawn(reaper.run(shutdown_rx));

        Arc::new(Self {
            config,
            registry,
            sources,
            store,
            platform,
            service,
            relay,
            shutdown_tx,
            reaper_handle: Mutex::new(Some(reaper_handle)),
        })
    }

    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/markers.json", post(http::markers))
            .route("/addMarker.json", post(http::add_marker))
            .with_state(Arc::clone(self))
    }

    /// Channel the external media relay engine feeds its notifications
    /// into; events are applied by a dedicated task until shutdown.
    pub fn relay_events(self: &Arc<Self>) -> mpsc::Sender<RelayEvent> {
        let (tx, mut rx) = mpsc::channel(256);
        let server = Arc::clone(self);
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Some(event) => server.apply_relay_event(event),
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
        });

        tx
    }

    fn apply_relay_event(&self, event: RelayEvent) {
        match event {
            RelayEvent::NewConnection(id) => {
                info!("Relay engine reports new connection [{id}]");
            }
            RelayEvent::NewSource {
                source_id,
                connection_id,
            } => {
                self.sources.on_new_source(source_id, connection_id);
            }
            RelayEvent::SourceEnabled(id) => {
                self.sources.on_source_enabled(&id);
            }
            RelayEvent::ConnectionClosed(id) => {
                self.relay.disconnect(&id);
                self.sources.remove_for_connection(&id);
            }
        }
    }

    pub async fn markers(&self) -> Result<Vec<Marker>, RelayError> {
        self.store.select_all().await
    }

    /// Persists a marker. When it names a recording, a media entry is
    /// created first and the recording's delivery is bound to an upload
    /// into that entry.
    pub async fn add_marker(&self, draft: MarkerDraft) -> Result<Marker, RelayError> {
        match &draft.recording_id {
            Some(recording_id) => {
                let entry_id = self
                    .platform
                    .create_entry(EntryMetadata {
                        name: draft.title.clone(),
                        description: draft.description.clone(),
                    })
                    .await?;
                bind_recording_upload(
                    &self.registry,
                    Arc::clone(&self.platform),
                    entry_id.clone(),
                    recording_id,
                )?;
                self.store.insert(&draft, Some(&entry_id)).await
            }
            None => self.store.insert(&draft, None).await,
        }
    }

    /// Stops the reaper and the engine event loop. In-flight recording
    /// sessions are abandoned: their processes finish on their own and
    /// deliveries into evicted slots are no-ops.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self
            .reaper_handle
            .lock()
            .expect("reaper handle poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

use crate::error::RelayError;
use crate::media::SourceInfo;
use crate::recording::session::{DeliveryFn, RecordingSession};
use crate::recording::streamer::Streamer;
use dashmap::{DashMap, DashSet};
use geocast_core::SourceId;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Table of in-flight recording sessions, owned by the server state.
///
/// An id present here corresponds to exactly one recording attempt.
/// Re-triggering a recording while a live session exists is rejected
/// rather than silently orphaning the previous process handle.
pub struct RecordingRegistry {
    sessions: DashMap<SourceId, Arc<RecordingSession>>,
    /// Ids with a spawn in flight, reserved before the process starts so
    /// two concurrent starts for one id cannot both pass the guard.
    starting: DashSet<SourceId>,
    streamer: Arc<dyn Streamer>,
    recordings_dir: PathBuf,
    stale_after: Duration,
}

impl RecordingRegistry {
    pub fn new(streamer: Arc<dyn Streamer>, recordings_dir: PathBuf, stale_after: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            starting: DashSet::new(),
            streamer,
            recordings_dir,
            stale_after,
        }
    }

    /// Starts a recording for `source` and registers the session. The
    /// source-exists / source-enabled precondition is the caller's
    /// responsibility; this only guards against duplicate starts.
    pub async fn start_recording(
        &self,
        source: &SourceInfo,
    ) -> Result<Arc<RecordingSession>, RelayError> {
        if let Some(existing) = self.sessions.get(&source.id) {
            if !existing.is_closed() && !existing.is_stale() {
                return Err(RelayError::AlreadyRecording(source.id.clone()));
            }
        }
        // reserve the id before awaiting the spawn; the loser of a
        // concurrent start never reaches the streamer
        if !self.starting.insert(source.id.clone()) {
            return Err(RelayError::AlreadyRecording(source.id.clone()));
        }

        let file_path = self.recordings_dir.join(format!("{}.mp4", source.id));
        let log_path = self.recordings_dir.join(format!("{}.log", source.id));

        info!("Source [{}] recording to {}", source.id, file_path.display());

        let started = RecordingSession::start(
            source.id.clone(),
            &source.locator,
            file_path,
            log_path,
            self.stale_after,
            self.streamer.as_ref(),
        )
        .await;

        let session = match started {
            Ok(session) => session,
            Err(e) => {
                self.starting.remove(&source.id);
                return Err(e.into());
            }
        };

        self.sessions.insert(source.id.clone(), Arc::clone(&session));
        self.starting.remove(&source.id);
        Ok(session)
    }

    /// Forwards a delivery callback to the session for `id`.
    pub fn attach_delivery(&self, id: &SourceId, callback: DeliveryFn) -> Result<(), RelayError> {
        let session = self
            .sessions
            .get(id)
            .ok_or_else(|| RelayError::UnknownSession(id.clone()))?;
        session.on_ready(callback);
        Ok(())
    }

    /// Removes every session that is closed or stale. Dropping the map
    /// entry never cancels the underlying process: its watcher task keeps
    /// its own handle and a late exit delivers into an empty slot.
    pub fn sweep(&self) {
        // counted inside the closure: inserts may land mid-retain, so a
        // before/after length diff is not reliable
        let mut removed = 0usize;
        self.sessions.retain(|_, session| {
            let reapable = session.is_closed() || session.is_stale();
            if reapable {
                removed += 1;
            }
            !reapable
        });
        if removed > 0 {
            debug!("Swept {removed} recording session(s)");
        }
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

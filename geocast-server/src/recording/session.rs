use crate::recording::streamer::{StreamEvent, Streamer};
use geocast_core::SourceId;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Single-slot delivery callback, invoked with the finished file's path.
pub type DeliveryFn = Box<dyn FnOnce(PathBuf) + Send + 'static>;

struct SessionState {
    ready: bool,
    closed: bool,
    delivery: Option<DeliveryFn>,
}

/// One capture-in-progress: owns the watcher of an external streaming
/// process and an at-most-once delivery notification.
///
/// Invariant: `closed` implies `ready`. Delivery fires only when both
/// `ready` and a registered callback are present, and firing sets `closed`,
/// so a duplicate exit event can never re-fire it.
pub struct RecordingSession {
    id: SourceId,
    created_at: Instant,
    stale_after: Duration,
    file_path: PathBuf,
    log_path: PathBuf,
    state: Mutex<SessionState>,
}

impl RecordingSession {
    /// Starts the streaming process immediately and fails fast if it
    /// cannot be spawned; the caller must not register the session in that
    /// case. On success a watcher task owns the process events for the
    /// session's whole lifetime, independent of registry membership.
    pub async fn start(
        id: SourceId,
        locator: &str,
        file_path: PathBuf,
        log_path: PathBuf,
        stale_after: Duration,
        streamer: &dyn Streamer,
    ) -> std::io::Result<Arc<Self>> {
        let mut events = streamer.start(locator, &file_path, &log_path).await?;

        let session = Arc::new(Self {
            id,
            created_at: Instant::now(),
            stale_after,
            file_path,
            log_path,
            state: Mutex::new(SessionState {
                ready: false,
                closed: false,
                delivery: None,
            }),
        });

        let watcher = Arc::clone(&session);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    StreamEvent::Error(err) => {
                        error!("Streamer [{}] error: {err}", watcher.id);
                    }
                    StreamEvent::Exited { code, signal } => {
                        info!(
                            "Streamer [{}] closed (code {code:?}, signal {signal:?}), log: {}",
                            watcher.id,
                            watcher.log_path.display()
                        );
                        watcher.on_process_exit(code, signal);
                    }
                }
            }
        });

        Ok(session)
    }

    pub fn id(&self) -> &SourceId {
        &self.id
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Marks the session ready and attempts delivery. A no-op beyond the
    /// first delivery; duplicate exits are logged and ignored.
    pub fn on_process_exit(&self, _code: Option<i32>, _signal: Option<i32>) {
        {
            let mut state = self.state.lock().expect("session state poisoned");
            if state.ready {
                warn!("Duplicate exit event for recording [{}]", self.id);
            }
            state.ready = true;
        }
        self.try_deliver();
    }

    /// Registers the delivery callback. Fires synchronously within this
    /// call when the session is already ready. Re-registering before
    /// delivery replaces the previous slot; registering after delivery is
    /// dropped. Both cases are logged and the callback never fires twice.
    pub fn on_ready(&self, callback: DeliveryFn) {
        {
            let mut state = self.state.lock().expect("session state poisoned");
            if state.closed {
                warn!(
                    "Recording [{}] already delivered, dropping late callback",
                    self.id
                );
                return;
            }
            if state.delivery.is_some() {
                warn!("Replacing delivery callback for recording [{}]", self.id);
            }
            state.delivery = Some(callback);
        }
        self.try_deliver();
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().expect("session state poisoned").ready
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().expect("session state poisoned").closed
    }

    /// True once the session's age reaches the reclaim threshold,
    /// regardless of readiness.
    pub fn is_stale(&self) -> bool {
        self.created_at.elapsed() >= self.stale_after
    }

    fn try_deliver(&self) {
        let callback = {
            let mut state = self.state.lock().expect("session state poisoned");
            if state.ready && !state.closed && state.delivery.is_some() {
                state.closed = true;
                state.delivery.take()
            } else {
                None
            }
        };
        if let Some(callback) = callback {
            callback(self.file_path.clone());
        }
    }
}

// manual impl: the delivery slot holds an opaque FnOnce
impl fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSession")
            .field("id", &self.id)
            .field("ready", &self.is_ready())
            .field("closed", &self.is_closed())
            .field("file_path", &self.file_path)
            .finish()
    }
}

use async_trait::async_trait;
use geocast_core::{Marker, MarkerDraft};
use geocast_server::RelayError;
use geocast_server::store::{MarkerStore, epoch_ms};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory MarkerStore for tests that need real insert/select semantics
/// without a database file.
#[derive(Default)]
pub struct MemoryStore {
    markers: Mutex<Vec<Marker>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plants a marker with an explicit creation time, for retention tests.
    pub fn insert_at(&self, title: &str, created_at: i64) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.markers.lock().unwrap().push(Marker {
            id,
            position: geocast_core::GeoPosition { lat: 0.0, lng: 0.0 },
            title: title.to_string(),
            description: None,
            entry_id: None,
            created_at,
        });
    }

    pub fn titles(&self) -> Vec<String> {
        self.markers
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.title.clone())
            .collect()
    }
}

#[async_trait]
impl MarkerStore for MemoryStore {
    async fn insert(
        &self,
        draft: &MarkerDraft,
        entry_id: Option<&str>,
    ) -> Result<Marker, RelayError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let marker = Marker {
            id,
            position: draft.position,
            title: draft.title.clone(),
            description: draft.description.clone(),
            entry_id: entry_id.map(str::to_string),
            created_at: epoch_ms(),
        };
        self.markers.lock().unwrap().push(marker.clone());
        Ok(marker)
    }

    async fn select_all(&self) -> Result<Vec<Marker>, RelayError> {
        Ok(self.markers.lock().unwrap().clone())
    }

    async fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, RelayError> {
        let mut markers = self.markers.lock().unwrap();
        let before = markers.len();
        markers.retain(|m| m.created_at >= cutoff_ms);
        Ok((before - markers.len()) as u64)
    }
}

/// MarkerStore whose deletions take a configurable time, with an in-flight
/// gauge for observing tick overlap.
pub struct SlowStore {
    delay: Duration,
    deletes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deletes: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarkerStore for SlowStore {
    async fn insert(
        &self,
        _draft: &MarkerDraft,
        _entry_id: Option<&str>,
    ) -> Result<Marker, RelayError> {
        unimplemented!("SlowStore only models deletions")
    }

    async fn select_all(&self) -> Result<Vec<Marker>, RelayError> {
        Ok(Vec::new())
    }

    async fn delete_older_than(&self, _cutoff_ms: i64) -> Result<u64, RelayError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

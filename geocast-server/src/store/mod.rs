mod sqlite;

pub use sqlite::SqliteMarkerStore;

use crate::error::RelayError;
use async_trait::async_trait;
use geocast_core::{Marker, MarkerDraft};
use std::time::{SystemTime, UNIX_EPOCH};

/// Boundary to the persisted marker store. CRUD only; retention policy
/// lives in the reaper.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn insert(
        &self,
        draft: &MarkerDraft,
        entry_id: Option<&str>,
    ) -> Result<Marker, RelayError>;

    async fn select_all(&self) -> Result<Vec<Marker>, RelayError>;

    /// Deletes markers created before `cutoff_ms` (epoch milliseconds),
    /// returning how many rows went away.
    async fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, RelayError>;
}

pub fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

mod binder;

pub use binder::bind_recording_upload;

use crate::error::RelayError;
use async_trait::async_trait;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

/// Metadata for a media entry created ahead of its upload.
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    pub name: String,
    pub description: Option<String>,
}

/// Boundary to the remote media platform. Calls from the delivery path are
/// fire-and-forget: errors are logged, never retried.
#[async_trait]
pub trait MediaPlatform: Send + Sync {
    async fn create_entry(&self, metadata: EntryMetadata) -> Result<String, RelayError>;

    async fn upload_file(&self, entry_id: &str, file_path: &Path) -> Result<(), RelayError>;
}

/// Stand-in used when no platform integration is configured: mints local
/// entry ids and leaves the recording file on disk. A concrete platform
/// client replaces this at server construction.
pub struct NullPlatform;

#[async_trait]
impl MediaPlatform for NullPlatform {
    async fn create_entry(&self, metadata: EntryMetadata) -> Result<String, RelayError> {
        let entry_id = format!("local-{}", Uuid::new_v4());
        warn!(
            "No media platform configured; assigned local entry [{entry_id}] for '{}'",
            metadata.name
        );
        Ok(entry_id)
    }

    async fn upload_file(&self, entry_id: &str, file_path: &Path) -> Result<(), RelayError> {
        warn!(
            "No media platform configured; keeping {} for entry [{entry_id}]",
            file_path.display()
        );
        Ok(())
    }
}

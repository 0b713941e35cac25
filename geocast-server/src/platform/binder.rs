use crate::error::RelayError;
use crate::platform::MediaPlatform;
use crate::recording::RecordingRegistry;
use geocast_core::SourceId;
use std::sync::Arc;
use tracing::{error, info};

/// Binds a recording's delivery to an upload of the finished file.
///
/// Fails with `UnknownSession` when the recording is not registered; once
/// bound, the upload runs as its own task when the file is ready. Upload
/// failures are logged and the local marker record is not rolled back.
pub fn bind_recording_upload(
    registry: &RecordingRegistry,
    platform: Arc<dyn MediaPlatform>,
    entry_id: String,
    recording_id: &SourceId,
) -> Result<(), RelayError> {
    registry.attach_delivery(
        recording_id,
        Box::new(move |file_path| {
            tokio::spawn(async move {
                match platform.upload_file(&entry_id, &file_path).await {
                    Ok(()) => info!(
                        "Uploaded {} to entry [{entry_id}]",
                        file_path.display()
                    ),
                    Err(e) => error!(
                        "Upload of {} to entry [{entry_id}] failed: {e}",
                        file_path.display()
                    ),
                }
            });
        }),
    )
}

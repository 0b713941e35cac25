use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use geocast_core::SourceId;
use thiserror::Error;

/// Failure taxonomy of the signaling relay and recording lifecycle.
///
/// Precondition failures and unknown-session lookups are recoverable and
/// surfaced to the originating connection as `error` events; they never
/// affect other sessions. Process and store failures are logged at the
/// point they occur.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("source stream not found")]
    SourceUnavailable,

    #[error("source stream not enabled")]
    SourceDisabled,

    #[error("no pending offer for this connection")]
    NoPendingOffer,

    #[error("no recording session for source [{0}]")]
    UnknownSession(SourceId),

    #[error("recording already in progress for source [{0}]")]
    AlreadyRecording(SourceId),

    #[error("failed to start streaming process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("media platform error: {0}")]
    Upstream(String),
}

impl RelayError {
    /// True for failures caused by the caller's request rather than the
    /// server's own state.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RelayError::SourceUnavailable
                | RelayError::SourceDisabled
                | RelayError::NoPendingOffer
                | RelayError::AlreadyRecording(_)
        )
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = if self.is_precondition() {
            StatusCode::BAD_REQUEST
        } else if matches!(self, RelayError::UnknownSession(_)) {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.to_string()).into_response()
    }
}

use crate::negotiator::NegotiationState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NegotiationError {
    /// An offer cannot be produced without at least one local track.
    #[error("no local media attached")]
    NoLocalMedia,

    #[error("{action} is not valid in state {state:?}")]
    InvalidState {
        action: &'static str,
        state: NegotiationState,
    },

    #[error("no peer connection exists")]
    NoPeerConnection,

    #[error(transparent)]
    WebRtc(#[from] webrtc::Error),
}

use crate::error::NegotiationError;
use geocast_core::SignalMessage;
use std::sync::Arc;
use tracing::{debug, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferPending,
    AnswerPending,
    Established,
}

/// Client-held negotiation state machine.
///
/// Owns at most one peer connection. The caller path runs
/// `Idle → OfferPending → Established`; the callee path runs
/// `Idle → AnswerPending → Established`. `receive_offer` on an
/// `Established` machine reuses the live connection (renegotiation).
pub struct Negotiator {
    state: NegotiationState,
    peer: Option<Arc<RTCPeerConnection>>,
    local_tracks: Vec<Arc<TrackLocalStaticSample>>,
    ice_servers: Vec<String>,
}

impl Negotiator {
    pub fn new(ice_servers: Vec<String>) -> Self {
        Self {
            state: NegotiationState::Idle,
            peer: None,
            local_tracks: Vec::new(),
            ice_servers,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Attaches a local track. Must happen before the first offer.
    pub fn add_track(&mut self, track: Arc<TrackLocalStaticSample>) {
        self.local_tracks.push(track);
    }

    /// Produces an SDP offer and moves to `OfferPending`. Valid only from
    /// `Idle`, and only once local media is attached.
    pub async fn create_offer(&mut self) -> Result<String, NegotiationError> {
        if self.state != NegotiationState::Idle {
            return Err(NegotiationError::InvalidState {
                action: "create_offer",
                state: self.state,
            });
        }

        let peer = self.prepare_connection().await?;
        let offer = peer.create_offer(None).await?;
        peer.set_local_description(offer.clone()).await?;

        self.state = NegotiationState::OfferPending;
        Ok(offer.sdp)
    }

    /// Applies a remote offer and synchronously answers it. Reuses the
    /// live connection when one exists, which covers renegotiation of an
    /// `Established` session.
    pub async fn receive_offer(&mut self, sdp: String) -> Result<String, NegotiationError> {
        if self.state == NegotiationState::OfferPending {
            return Err(NegotiationError::InvalidState {
                action: "receive_offer",
                state: self.state,
            });
        }

        let peer = self.prepare_connection().await?;
        peer.set_remote_description(RTCSessionDescription::offer(sdp)?)
            .await?;
        self.state = NegotiationState::AnswerPending;

        let answer = peer.create_answer(None).await?;
        peer.set_local_description(answer.clone()).await?;

        self.state = NegotiationState::Established;
        Ok(answer.sdp)
    }

    /// Applies the remote answer to our pending offer.
    pub async fn receive_answer(&mut self, sdp: String) -> Result<(), NegotiationError> {
        if self.state != NegotiationState::OfferPending {
            return Err(NegotiationError::InvalidState {
                action: "receive_answer",
                state: self.state,
            });
        }
        let peer = self.peer.as_ref().ok_or(NegotiationError::NoPeerConnection)?;

        peer.set_remote_description(RTCSessionDescription::answer(sdp)?)
            .await?;
        self.state = NegotiationState::Established;
        Ok(())
    }

    /// Dispatches a relay message to the matching transition. Returns the
    /// message the client should send back, if any.
    pub async fn handle_signal(
        &mut self,
        msg: SignalMessage,
    ) -> Result<Option<SignalMessage>, NegotiationError> {
        match msg {
            SignalMessage::Offer { sdp } => {
                let answer = self.receive_offer(sdp).await?;
                Ok(Some(SignalMessage::Answer { sdp: answer }))
            }
            SignalMessage::Answer { sdp } => {
                self.receive_answer(sdp).await?;
                Ok(None)
            }
            SignalMessage::Error { message } => {
                warn!("Relay reported error: {message}");
                Ok(None)
            }
            other => {
                debug!("Ignoring non-negotiation message: {other:?}");
                Ok(None)
            }
        }
    }

    /// Releases the peer connection and local tracks; the machine starts
    /// over from `Idle`.
    pub async fn close(&mut self) -> Result<(), NegotiationError> {
        if let Some(peer) = self.peer.take() {
            peer.close().await?;
        }
        self.local_tracks.clear();
        self.state = NegotiationState::Idle;
        Ok(())
    }

    /// Returns the live peer connection, or builds one and attaches the
    /// local tracks to it. Refuses to build with no media attached.
    async fn prepare_connection(
        &mut self,
    ) -> Result<Arc<RTCPeerConnection>, NegotiationError> {
        if let Some(peer) = &self.peer {
            return Ok(Arc::clone(peer));
        }
        if self.local_tracks.is_empty() {
            return Err(NegotiationError::NoLocalMedia);
        }

        let mut media = MediaEngine::default();
        media.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media)?;

        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: self.ice_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let peer = Arc::new(api.new_peer_connection(config).await?);
        for track in &self.local_tracks {
            peer.add_track(Arc::clone(track) as Arc<dyn TrackLocal + Send + Sync>)
                .await?;
        }

        self.peer = Some(Arc::clone(&peer));
        Ok(peer)
    }
}

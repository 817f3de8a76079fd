//! Signaling for the realtime voice peer connection
//!
//! The peer connection itself (WebRTC or any other transport) is a vendor
//! capability behind [`PeerConnector`] / [`PeerConnection`]. This module
//! owns the credential → offer → relay → answer → remote track sequence.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiClient, RealtimeSessionRequest};
use crate::media::MediaStream;
use crate::{Error, Result};

/// An open peer connection to the realtime voice backend
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Create the local SDP offer
    async fn create_offer(&self) -> Result<String>;

    /// Apply the remote SDP answer
    async fn set_remote_answer(&self, sdp: &str) -> Result<()>;

    /// Resolve once the remote audio track has arrived
    async fn remote_audio(&self) -> Result<MediaStream>;

    /// Send one JSON event over the data channel
    async fn send(&self, event: String) -> Result<()>;

    /// Next JSON event from the data channel; `None` once the channel closes
    async fn recv(&self) -> Option<String>;

    /// Close the connection. Must tolerate repeated calls.
    fn close(&self);
}

/// Opens peer connections that send the given local stream
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn open(&self, local: &MediaStream) -> Result<Box<dyn PeerConnection>>;
}

/// Parameters for one connection attempt
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Stream whose audio is sent to the interviewer
    pub local: MediaStream,
    pub language: String,
    pub instructions: Option<String>,
    pub voice: Option<String>,
}

enum SignalingState {
    Disconnected,
    /// Peer opened, offer/answer still in flight
    Negotiating {
        peer: Box<dyn PeerConnection>,
    },
    Connected {
        peer: Box<dyn PeerConnection>,
        remote: MediaStream,
    },
}

/// Establishes and tears down the voice connection
pub struct SignalingClient {
    api: ApiClient,
    connector: Arc<dyn PeerConnector>,
    remote_track_timeout: Duration,
    state: SignalingState,
}

impl SignalingClient {
    #[must_use]
    pub fn new(api: ApiClient, connector: Arc<dyn PeerConnector>, remote_track_timeout: Duration) -> Self {
        Self {
            api,
            connector,
            remote_track_timeout,
            state: SignalingState::Disconnected,
        }
    }

    /// Whether a connection is open
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SignalingState::Connected { .. })
    }

    /// Remote audio of the open connection
    #[must_use]
    pub fn remote_audio(&self) -> Option<&MediaStream> {
        match &self.state {
            SignalingState::Connected { remote, .. } => Some(remote),
            SignalingState::Negotiating { .. } | SignalingState::Disconnected => None,
        }
    }

    /// Connect to the realtime voice backend
    ///
    /// Returns the remote audio stream for playback and recording.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the credential request fails, the relay
    /// rejects the offer, or no remote track arrives in time; returns
    /// [`Error::InvalidState`] if already connected
    pub async fn connect(&mut self, params: &ConnectParams) -> Result<MediaStream> {
        if self.is_connected() {
            return Err(Error::InvalidState("voice connection already open".to_string()));
        }
        self.disconnect();

        let credential = self
            .api
            .realtime_session(&RealtimeSessionRequest {
                language: params.language.clone(),
                instructions: params.instructions.clone(),
                voice: params.voice.clone(),
            })
            .await
            .map_err(|e| Error::Connection(format!("credential request failed: {e}")))?;

        let peer = self
            .connector
            .open(&params.local)
            .await
            .map_err(|e| Error::Connection(format!("failed to open peer connection: {e}")))?;

        // Kept in state so a disconnect after an abandoned connect closes it
        self.state = SignalingState::Negotiating { peer };
        let negotiated = match &self.state {
            SignalingState::Negotiating { peer } => {
                self.negotiate(peer.as_ref(), &credential.key).await
            }
            _ => Err(Error::InvalidState("voice connection reset during negotiation".to_string())),
        };

        match (negotiated, std::mem::replace(&mut self.state, SignalingState::Disconnected)) {
            (Ok(remote), SignalingState::Negotiating { peer }) => {
                tracing::info!(remote_stream = %remote.id(), "voice connection established");
                self.state = SignalingState::Connected {
                    peer,
                    remote: remote.clone(),
                };
                Ok(remote)
            }
            (outcome, state) => {
                if let SignalingState::Negotiating { peer } = state {
                    peer.close();
                }
                let e = match outcome {
                    Ok(remote) => {
                        remote.stop_all();
                        Error::InvalidState("voice connection reset during negotiation".to_string())
                    }
                    Err(e) => e,
                };
                tracing::warn!(error = %e, "voice connection failed");
                Err(e)
            }
        }
    }

    async fn negotiate(
        &self,
        peer: &dyn PeerConnection,
        key: &secrecy::SecretString,
    ) -> Result<MediaStream> {
        let offer = peer
            .create_offer()
            .await
            .map_err(|e| Error::Connection(format!("failed to create offer: {e}")))?;

        let answer = self
            .api
            .exchange_sdp(key, &offer)
            .await
            .map_err(|e| Error::Connection(format!("relay rejected offer: {e}")))?;

        peer.set_remote_answer(&answer)
            .await
            .map_err(|e| Error::Connection(format!("failed to apply answer: {e}")))?;

        match tokio::time::timeout(self.remote_track_timeout, peer.remote_audio()).await {
            Ok(Ok(remote)) if remote.has_audio() => Ok(remote),
            Ok(Ok(_)) => Err(Error::Connection("remote stream has no audio track".to_string())),
            Ok(Err(e)) => Err(Error::Connection(format!("remote track failed: {e}"))),
            Err(_) => Err(Error::Connection(format!(
                "no remote audio track within {}s",
                self.remote_track_timeout.as_secs_f32()
            ))),
        }
    }

    /// Send an event to the voice backend
    ///
    /// # Errors
    ///
    /// Returns error if not connected or the send fails
    pub async fn send(&self, event: &serde_json::Value) -> Result<()> {
        match &self.state {
            SignalingState::Connected { peer, .. } => peer.send(event.to_string()).await,
            SignalingState::Negotiating { .. } | SignalingState::Disconnected => {
                Err(Error::InvalidState("voice connection is not open".to_string()))
            }
        }
    }

    /// Wait for the next data-channel message; `None` when closed or disconnected
    pub async fn next_message(&self) -> Option<String> {
        match &self.state {
            SignalingState::Connected { peer, .. } => peer.recv().await,
            SignalingState::Negotiating { .. } | SignalingState::Disconnected => None,
        }
    }

    /// Close the connection and stop remote playback
    ///
    /// Returns `false` when there was nothing to close.
    pub fn disconnect(&mut self) -> bool {
        match std::mem::replace(&mut self.state, SignalingState::Disconnected) {
            SignalingState::Connected { peer, remote } => {
                peer.close();
                remote.stop_all();
                tracing::info!("voice connection closed");
                true
            }
            SignalingState::Negotiating { peer } => {
                peer.close();
                tracing::info!("abandoned voice negotiation closed");
                true
            }
            SignalingState::Disconnected => false,
        }
    }
}

impl Drop for SignalingClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

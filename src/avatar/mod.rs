//! Streaming avatar sessions
//!
//! The server creates and stops vendor sessions; audio for the avatar to
//! lip-sync is streamed straight to the vendor over a WebSocket.

mod socket;

pub use socket::{AvatarSocket, SocketConnector, TungsteniteConnector};

use std::sync::Arc;

use base64::Engine;

use crate::api::{ApiClient, AvatarSession, CreateAvatarSessionRequest, TaskType};
use crate::config::AvatarConfig;
use crate::retry::{RetryPolicy, with_retry};
use crate::{Error, Result};

enum AvatarState {
    Idle,
    Created(AvatarSession),
    Connected {
        session: AvatarSession,
        socket: Box<dyn AvatarSocket>,
    },
    Closed,
}

/// Client for one avatar session
pub struct AvatarClient {
    api: ApiClient,
    connector: Arc<dyn SocketConnector>,
    retry: RetryPolicy,
    state: AvatarState,
}

impl AvatarClient {
    #[must_use]
    pub fn new(api: ApiClient, connector: Arc<dyn SocketConnector>, retry: RetryPolicy) -> Self {
        Self {
            api,
            connector,
            retry,
            state: AvatarState::Idle,
        }
    }

    /// Client retrying the WebSocket per the configured avatar policy
    #[must_use]
    pub fn from_config(
        api: ApiClient,
        connector: Arc<dyn SocketConnector>,
        config: &AvatarConfig,
    ) -> Self {
        Self::new(api, connector, config.retry.clone())
    }

    /// The server session, once created
    #[must_use]
    pub fn session(&self) -> Option<&AvatarSession> {
        match &self.state {
            AvatarState::Created(session) | AvatarState::Connected { session, .. } => Some(session),
            AvatarState::Idle | AvatarState::Closed => None,
        }
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.state, AvatarState::Connected { .. })
    }

    /// Create and start a server session
    ///
    /// If starting fails the created session is kept so that
    /// [`disconnect`](Self::disconnect) still stops it.
    ///
    /// # Errors
    ///
    /// Returns error if either request fails, or [`Error::InvalidState`] if a
    /// session already exists
    pub async fn start(&mut self, request: &CreateAvatarSessionRequest) -> Result<()> {
        if !matches!(self.state, AvatarState::Idle) {
            return Err(Error::InvalidState("avatar session already started".to_string()));
        }

        let session = self.api.create_avatar_session(request).await?;
        let session_id = session.session_id.clone();
        self.state = AvatarState::Created(session);

        self.api.start_avatar_session(&session_id).await
    }

    /// Open the vendor WebSocket
    ///
    /// Attempts are retried per the configured policy (3 attempts, waiting
    /// 2s then 4s by default). Rejected credentials are not retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vendor`] once every attempt has failed, or
    /// [`Error::InvalidState`] without a started session
    pub async fn connect_websocket(&mut self) -> Result<()> {
        let session = match std::mem::replace(&mut self.state, AvatarState::Closed) {
            AvatarState::Created(session) => session,
            other => {
                self.state = other;
                return Err(Error::InvalidState(
                    "avatar websocket needs a started, unconnected session".to_string(),
                ));
            }
        };

        let connector = &self.connector;
        let endpoint = session.realtime_endpoint.as_str();
        let token = session.access_token.as_deref();
        let result = with_retry(&self.retry, "avatar websocket", Error::is_recoverable, || {
            connector.connect(endpoint, token)
        })
        .await;

        match result {
            Ok(socket) => {
                tracing::info!(session_id = %session.session_id, "avatar websocket connected");
                self.state = AvatarState::Connected { session, socket };
                Ok(())
            }
            Err(e) => {
                tracing::error!(session_id = %session.session_id, error = %e, "avatar websocket failed");
                self.state = AvatarState::Created(session);
                Err(Error::Vendor(format!("avatar websocket connection failed: {e}")))
            }
        }
    }

    /// Stream PCM16 audio for the avatar to speak
    ///
    /// # Errors
    ///
    /// Returns error if the socket is not connected or the send fails
    pub async fn send_audio(&self, pcm: &[i16]) -> Result<()> {
        let AvatarState::Connected { socket, .. } = &self.state else {
            return Err(Error::InvalidState("avatar websocket is not connected".to_string()));
        };
        socket.send_text(speak_frame(pcm).to_string()).await
    }

    /// Have the avatar speak or answer `text` via the server
    ///
    /// # Errors
    ///
    /// Returns error if there is no session or the request fails
    pub async fn speak(&self, text: &str, task_type: TaskType) -> Result<()> {
        let session = self
            .session()
            .ok_or_else(|| Error::InvalidState("no avatar session".to_string()))?;
        self.api
            .send_avatar_task(&session.session_id, text, task_type)
            .await
    }

    /// Close the socket and stop the server session
    ///
    /// Returns `false` when there was nothing to tear down. Failing to stop
    /// the server session is logged, not returned.
    pub async fn disconnect(&mut self) -> bool {
        let session = match std::mem::replace(&mut self.state, AvatarState::Closed) {
            AvatarState::Connected { session, socket } => {
                socket.close();
                session
            }
            AvatarState::Created(session) => session,
            AvatarState::Idle | AvatarState::Closed => return false,
        };

        if let Err(e) = self.api.stop_avatar_session(&session.session_id).await {
            tracing::warn!(session_id = %session.session_id, error = %e, "failed to stop avatar session");
        } else {
            tracing::info!(session_id = %session.session_id, "avatar session stopped");
        }
        true
    }
}

impl Drop for AvatarClient {
    fn drop(&mut self) {
        match std::mem::replace(&mut self.state, AvatarState::Closed) {
            AvatarState::Connected { session, socket } => {
                socket.close();
                tracing::warn!(session_id = %session.session_id, "avatar client dropped without disconnect");
            }
            AvatarState::Created(session) => {
                tracing::warn!(session_id = %session.session_id, "avatar client dropped without disconnect");
            }
            AvatarState::Idle | AvatarState::Closed => {}
        }
    }
}

/// JSON frame asking the avatar to speak `pcm` (16-bit little-endian, base64)
fn speak_frame(pcm: &[i16]) -> serde_json::Value {
    let bytes: Vec<u8> = pcm.iter().flat_map(|s| s.to_le_bytes()).collect();
    serde_json::json!({
        "type": "agent.speak",
        "audio": base64::engine::general_purpose::STANDARD.encode(bytes),
        "event_id": uuid::Uuid::new_v4().to_string(),
    })
}

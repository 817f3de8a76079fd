//! Avatar (HeyGen) session endpoints

use serde::{Deserialize, Serialize};

use super::{Ack, ApiClient};
use crate::{Error, Result};

/// Body of `POST /api/heygen/create-session`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvatarSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub language: String,
}

/// A server-created avatar session
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarSession {
    pub session_id: String,
    /// WebSocket endpoint that accepts audio frames
    pub realtime_endpoint: String,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Media room URL for the avatar video
    #[serde(default)]
    pub url: Option<String>,
}

impl std::fmt::Debug for AvatarSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarSession")
            .field("session_id", &self.session_id)
            .field("realtime_endpoint", &self.realtime_endpoint)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// How the avatar treats text sent through `send-task`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Speak the text verbatim
    Repeat,
    /// Treat the text as a prompt and answer it
    Talk,
}

/// Availability of the avatar vendor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarStatus {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRef<'a> {
    session_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendTaskRequest<'a> {
    session_id: &'a str,
    text: &'a str,
    task_type: TaskType,
}

impl ApiClient {
    /// Create an avatar session
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn create_avatar_session(
        &self,
        request: &CreateAvatarSessionRequest,
    ) -> Result<AvatarSession> {
        let session: AvatarSession = self.post_json("/api/heygen/create-session", request).await?;
        tracing::info!(session_id = %session.session_id, "avatar session created");
        Ok(session)
    }

    /// Start streaming for a created avatar session
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected
    pub async fn start_avatar_session(&self, session_id: &str) -> Result<()> {
        let ack: Ack = self
            .post_json("/api/heygen/start-session", &SessionRef { session_id })
            .await?;
        check_ack(ack, "start-session")
    }

    /// Ask the avatar to speak or answer `text`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected
    pub async fn send_avatar_task(
        &self,
        session_id: &str,
        text: &str,
        task_type: TaskType,
    ) -> Result<()> {
        let ack: Ack = self
            .post_json(
                "/api/heygen/send-task",
                &SendTaskRequest {
                    session_id,
                    text,
                    task_type,
                },
            )
            .await?;
        check_ack(ack, "send-task")
    }

    /// Stop an avatar session
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn stop_avatar_session(&self, session_id: &str) -> Result<()> {
        let ack: Ack = self
            .post_json("/api/heygen/stop-session", &SessionRef { session_id })
            .await?;
        check_ack(ack, "stop-session")
    }

    /// Check whether the avatar vendor is reachable
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn avatar_status(&self) -> Result<AvatarStatus> {
        self.get_json("/api/heygen/status").await
    }
}

fn check_ack(ack: Ack, what: &str) -> Result<()> {
    if ack.success {
        Ok(())
    } else {
        Err(Error::Vendor(format!(
            "{what} rejected: {}",
            ack.message.unwrap_or_else(|| "no reason given".to_string())
        )))
    }
}

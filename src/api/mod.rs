//! Typed HTTP client for the recruiting backend
//!
//! Each submodule adds the endpoints of one backend area to [`ApiClient`]:
//!
//! - `career_insights`: document upload, analysis, suggestions, history
//! - `profile`: comprehensive profile save and autosave
//! - `interview`: text/voice interview sessions and recordings
//! - `practice`: practice interview start/complete
//! - `job_interview`: question generation, analysis, realtime credentials
//! - `heygen`: avatar session lifecycle
//! - `realtime`: SDP relay for the voice peer connection

mod career_insights;
mod heygen;
mod interview;
mod job_interview;
mod practice;
mod profile;
mod realtime;

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::{Error, Result};

pub use career_insights::{
    AnalyzeDocumentRequest, CareerSuggestions, DocumentAnalysis, InsightHistoryEntry,
    Suggestions, UploadedDocument,
};
pub use heygen::{AvatarSession, AvatarStatus, CreateAvatarSessionRequest, TaskType};
pub use interview::{
    ChunkUploadResponse, CompleteVoiceRequest, CompleteVoiceResponse, ParsedTranscription,
    Question, QuestionResponse, RecordingChunk, RecordingInfo, RespondResponse, SessionState,
    StartInterviewRequest,
};
pub use job_interview::{
    EphemeralCredential, GenerateQuestionsRequest, InterviewFeedback, RealtimeSessionRequest,
    SubmitInterviewRequest, SubmitInterviewResponse,
};
pub use practice::{PracticeCompleteRequest, PracticeSession, PracticeStartRequest};
pub use profile::SaveProfileResponse;

/// Generic acknowledgement body returned by mutation endpoints
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    /// Whether the backend accepted the request
    #[serde(default = "default_true")]
    pub success: bool,

    /// Optional human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

const fn default_true() -> bool {
    true
}

/// Client for the recruiting backend API
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    token: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the given base URL
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            token: None,
        }
    }

    /// Create a client from resolved configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("hireflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            token: config.token.clone(),
        })
    }

    /// Set the bearer token sent with every request
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Base URL this client talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(path, error = %e, "request failed");
            e
        })?;

        let status = response.status();
        tracing::debug!(path, status = %status, "received response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        tracing::warn!(path, status = %status, %message, "api error");

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path), path).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(Method::POST, path).json(body), path)
            .await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path), path).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body
///
/// The backend answers with `{"message": ...}` or `{"error": ...}`; anything
/// else is used verbatim when short enough to be useful.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(serde_json::Value::as_str) {
                return Some(msg.to_string());
            }
        }
    }

    (trimmed.len() <= 200).then(|| trimmed.to_string())
}

/// Percent-encode a path segment
fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

//! Interview session endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, segment};
use crate::realtime::ConversationMessage;
use crate::recording::RecordingResult;
use crate::{Error, Result};

/// An interview question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "question")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Question {
    /// Question with only text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            category: None,
        }
    }
}

/// A recorded answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question: String,
    pub answer: String,
}

/// Server-owned interview progress, cached by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_id: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub responses: Vec<QuestionResponse>,
    #[serde(default)]
    pub current_question_index: usize,
    #[serde(default)]
    pub is_complete: bool,
}

impl SessionState {
    /// The question awaiting an answer, if any
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete {
            return None;
        }
        self.questions.get(self.current_question_index)
    }
}

/// Body of `POST /api/interview/session`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewRequest {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RespondRequest<'a> {
    session_id: &'a str,
    question_index: usize,
    answer: &'a str,
}

/// Result of answering a question
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondResponse {
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub session: Option<SessionState>,
    #[serde(default)]
    pub next_question: Option<Question>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Body of `POST /api/interview/complete-voice`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteVoiceRequest {
    pub session_id: String,
    pub conversation: Vec<ConversationMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording: Option<RecordingResult>,
    pub audio_only: bool,
}

/// Result of submitting a voice interview
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteVoiceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// One uploaded piece of an interview recording
#[derive(Clone)]
pub struct RecordingChunk {
    pub session_id: String,
    pub index: u32,
    /// Final marker; asks the server to build the playback manifest
    pub is_final: bool,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for RecordingChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingChunk")
            .field("session_id", &self.session_id)
            .field("index", &self.index)
            .field("is_final", &self.is_final)
            .field("bytes", &self.data.len())
            .finish_non_exhaustive()
    }
}

/// Response to a chunk upload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUploadResponse {
    #[serde(default)]
    pub success: Option<bool>,
    /// Present once the final marker has been processed
    #[serde(default)]
    pub playlist_url: Option<String>,
}

/// Recording metadata for a finished session
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingInfo {
    #[serde(default)]
    pub playlist_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParseTranscriptionRequest<'a> {
    session_id: &'a str,
    conversation: &'a [ConversationMessage],
}

/// Question/answer pairs extracted from a voice transcript
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedTranscription {
    #[serde(default)]
    pub responses: Vec<QuestionResponse>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SessionBody {
    Bare(SessionState),
    Wrapped { session: Option<SessionState> },
}

impl ApiClient {
    /// Fetch the active interview session, if any
    ///
    /// # Errors
    ///
    /// Returns error if the request fails (a 404 means no session)
    pub async fn interview_session(&self) -> Result<Option<SessionState>> {
        match self.get_json::<SessionBody>("/api/interview/session").await {
            Ok(SessionBody::Bare(session)) => Ok(Some(session)),
            Ok(SessionBody::Wrapped { session }) => Ok(session),
            Err(Error::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Start a new interview session
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or no session is returned
    pub async fn start_interview_session(
        &self,
        request: &StartInterviewRequest,
    ) -> Result<SessionState> {
        let body: SessionBody = self.post_json("/api/interview/session", request).await?;
        let session = match body {
            SessionBody::Bare(session) => Some(session),
            SessionBody::Wrapped { session } => session,
        }
        .ok_or_else(|| Error::Api {
            status: 200,
            message: "backend did not return a session".to_string(),
        })?;

        tracing::info!(
            session_id = %session.session_id,
            questions = session.questions.len(),
            "interview session started"
        );
        Ok(session)
    }

    /// Submit a text answer to the current question
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn respond(
        &self,
        session_id: &str,
        question_index: usize,
        answer: &str,
    ) -> Result<RespondResponse> {
        self.post_json(
            "/api/interview/respond",
            &RespondRequest {
                session_id,
                question_index,
                answer,
            },
        )
        .await
    }

    /// Submit a finished voice interview
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn complete_voice_interview(
        &self,
        request: &CompleteVoiceRequest,
    ) -> Result<CompleteVoiceResponse> {
        self.post_json("/api/interview/complete-voice", request)
            .await
    }

    /// Upload one recording chunk, or the final marker
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn upload_recording_chunk(
        &self,
        chunk: &RecordingChunk,
    ) -> Result<ChunkUploadResponse> {
        let mut form = reqwest::multipart::Form::new()
            .text("sessionId", chunk.session_id.clone())
            .text("chunkIndex", chunk.index.to_string())
            .text("isFinal", chunk.is_final.to_string());

        if !chunk.data.is_empty() {
            let part = reqwest::multipart::Part::bytes(chunk.data.clone())
                .file_name(format!("chunk-{:05}.webm", chunk.index))
                .mime_str(&chunk.mime_type)
                .map_err(|e| Error::Recording(e.to_string()))?;
            form = form.part("chunk", part);
        }

        let path = "/api/interview/upload-recording";
        let response = self
            .send(
                self.request(reqwest::Method::POST, path).multipart(form),
                path,
            )
            .await?;
        Ok(response.json().await?)
    }

    /// Fetch recording metadata for a session
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn recording(&self, session_id: &str) -> Result<RecordingInfo> {
        self.get_json(&format!("/api/interview/recording/{}", segment(session_id)))
            .await
    }

    /// Turn a voice conversation into question/answer pairs
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn parse_transcription(
        &self,
        session_id: &str,
        conversation: &[ConversationMessage],
    ) -> Result<ParsedTranscription> {
        self.post_json(
            "/api/interview/parse-transcription",
            &ParseTranscriptionRequest {
                session_id,
                conversation,
            },
        )
        .await
    }
}

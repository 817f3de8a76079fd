//! Job-specific interview endpoints and realtime credentials

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::{ApiClient, Question, QuestionResponse};
use crate::realtime::ConversationMessage;
use crate::{Error, Result};

/// Body of `POST /api/job-interview/generate-questions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    pub job_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Deserialize)]
struct QuestionsBody {
    questions: Vec<Question>,
}

/// Evaluation of an interview
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewFeedback {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    job_title: &'a str,
    responses: &'a [QuestionResponse],
    language: &'a str,
}

/// Body of `POST /api/job-interview/submit`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInterviewRequest {
    pub job_title: String,
    pub responses: Vec<QuestionResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conversation: Vec<ConversationMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_url: Option<String>,
}

/// Result of submitting an interview
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInterviewResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub id: Option<String>,
}

/// Body of `POST /api/job-interview/session`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeSessionRequest {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Short-lived credential for a direct realtime connection
pub struct EphemeralCredential {
    pub key: SecretString,
    /// Unix seconds
    pub expires_at: Option<i64>,
}

impl std::fmt::Debug for EphemeralCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralCredential")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// The relay forwards the vendor's `client_secret` object, or a flattened key
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialBody {
    #[serde(default, alias = "client_secret")]
    client_secret: Option<ClientSecret>,
    #[serde(default)]
    ephemeral_key: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Deserialize)]
struct ClientSecret {
    value: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

impl ApiClient {
    /// Generate interview questions for a role
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn generate_questions(
        &self,
        request: &GenerateQuestionsRequest,
    ) -> Result<Vec<Question>> {
        let body: QuestionsBody = self
            .post_json("/api/job-interview/generate-questions", request)
            .await?;
        Ok(body.questions)
    }

    /// Evaluate answers for a role
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn analyze_interview(
        &self,
        job_title: &str,
        responses: &[QuestionResponse],
        language: &str,
    ) -> Result<InterviewFeedback> {
        self.post_json(
            "/api/job-interview/analyze",
            &AnalyzeRequest {
                job_title,
                responses,
                language,
            },
        )
        .await
    }

    /// Submit a finished job interview
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn submit_interview(
        &self,
        request: &SubmitInterviewRequest,
    ) -> Result<SubmitInterviewResponse> {
        self.post_json("/api/job-interview/submit", request).await
    }

    /// Request an ephemeral credential for the realtime voice backend
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or no key is returned
    pub async fn realtime_session(
        &self,
        request: &RealtimeSessionRequest,
    ) -> Result<EphemeralCredential> {
        let body: CredentialBody = self
            .post_json("/api/job-interview/session", request)
            .await?;

        let (key, expires_at) = match (body.client_secret, body.ephemeral_key) {
            (Some(secret), _) => (secret.value, secret.expires_at.or(body.expires_at)),
            (None, Some(key)) => (key, body.expires_at),
            (None, None) => {
                return Err(Error::Api {
                    status: 200,
                    message: "session response did not include an ephemeral key".to_string(),
                });
            }
        };

        if key.trim().is_empty() {
            return Err(Error::Api {
                status: 200,
                message: "session response contained an empty ephemeral key".to_string(),
            });
        }

        Ok(EphemeralCredential {
            key: SecretString::from(key),
            expires_at,
        })
    }
}

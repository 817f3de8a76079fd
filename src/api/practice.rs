//! Practice interview endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, InterviewFeedback, Question, QuestionResponse};
use crate::Result;

/// Body of `POST /api/practice-interview/start`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeStartRequest {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_count: Option<u32>,
    pub language: String,
}

/// A started practice interview
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    pub session_id: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Body of `POST /api/practice-interview/complete`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeCompleteRequest {
    pub session_id: String,
    pub responses: Vec<QuestionResponse>,
    pub language: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedbackBody {
    Wrapped { feedback: InterviewFeedback },
    Bare(InterviewFeedback),
}

impl ApiClient {
    /// Start a practice interview
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn start_practice(&self, request: &PracticeStartRequest) -> Result<PracticeSession> {
        let session: PracticeSession = self
            .post_json("/api/practice-interview/start", request)
            .await?;
        tracing::info!(
            session_id = %session.session_id,
            role = %request.role,
            questions = session.questions.len(),
            "practice interview started"
        );
        Ok(session)
    }

    /// Submit practice answers for feedback
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn complete_practice(
        &self,
        request: &PracticeCompleteRequest,
    ) -> Result<InterviewFeedback> {
        let body: FeedbackBody = self
            .post_json("/api/practice-interview/complete", request)
            .await?;
        Ok(match body {
            FeedbackBody::Wrapped { feedback } | FeedbackBody::Bare(feedback) => feedback,
        })
    }
}

//! Text-mode interview

use crate::api::{ApiClient, Question, QuestionResponse, SessionState, StartInterviewRequest};
use crate::notice::Notifier;
use crate::{Error, Result};

/// Which view the text interview shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextView {
    /// Waiting for an answer to the current question
    Question,
    /// Interview complete; showing the transcription
    Transcription,
}

/// A question-by-question interview answered in text
///
/// The server owns the session. Answers are appended to the cached copy as
/// they are submitted, and the cache is replaced with the server's copy once
/// the interview completes. Completion is terminal.
pub struct TextInterview {
    api: ApiClient,
    notifier: Notifier,
    session: SessionState,
    view: TextView,
}

impl TextInterview {
    /// Resume the open interview session, or start a new one
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be loaded or created
    pub async fn start(
        api: ApiClient,
        notifier: Notifier,
        request: &StartInterviewRequest,
    ) -> Result<Self> {
        let existing = match api.interview_session().await {
            Ok(session) => session.filter(|s| !s.is_complete),
            Err(e) => {
                tracing::warn!(error = %e, "could not load existing interview session");
                None
            }
        };

        let session = match existing {
            Some(session) => {
                tracing::info!(session_id = %session.session_id, "resuming interview session");
                session
            }
            None => match api.start_interview_session(request).await {
                Ok(session) => session,
                Err(e) => {
                    notifier.error("Couldn't start interview", e.to_string());
                    return Err(e);
                }
            },
        };

        Ok(Self::from_session(api, notifier, session))
    }

    /// Drive an already loaded session
    #[must_use]
    pub fn from_session(api: ApiClient, notifier: Notifier, session: SessionState) -> Self {
        let view = if session.is_complete || session.current_question().is_none() {
            TextView::Transcription
        } else {
            TextView::Question
        };
        Self {
            api,
            notifier,
            session,
            view,
        }
    }

    #[must_use]
    pub const fn view(&self) -> TextView {
        self.view
    }

    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.view {
            TextView::Question => self.session.current_question(),
            TextView::Transcription => None,
        }
    }

    /// Answers given so far
    #[must_use]
    pub fn responses(&self) -> &[QuestionResponse] {
        &self.session.responses
    }

    /// Submit an answer to the current question
    ///
    /// Returns the view to show next. On failure the view and cached session
    /// are unchanged and an error notice is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank answer,
    /// [`Error::InvalidState`] once the interview is complete, or the request
    /// error
    pub async fn submit_answer(&mut self, answer: &str) -> Result<TextView> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::Validation("answer is empty".to_string()));
        }

        let question = self
            .current_question()
            .map(|q| q.text.clone())
            .ok_or_else(|| Error::InvalidState("interview is already complete".to_string()))?;
        let index = self.session.current_question_index;

        let response = match self
            .api
            .respond(&self.session.session_id, index, answer)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.notifier.error("Couldn't submit answer", e.to_string());
                return Err(e);
            }
        };

        self.session.responses.push(QuestionResponse {
            question,
            answer: answer.to_string(),
        });
        self.session.current_question_index = index + 1;

        let server_complete = response.is_complete
            || response.session.as_ref().is_some_and(|s| s.is_complete);

        // Servers that stream questions send the next one with each reply
        if !server_complete {
            if let Some(next) = response.next_question {
                if self.session.questions.len() <= index + 1 {
                    self.session.questions.push(next);
                }
            }
        }

        let out_of_questions = self.session.current_question_index >= self.session.questions.len();
        if server_complete || out_of_questions {
            self.complete(response.session).await;
        }

        Ok(self.view)
    }

    async fn complete(&mut self, returned: Option<SessionState>) {
        let synced = match returned {
            Some(session) => Some(session),
            None => match self.api.interview_session().await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(error = %e, "could not re-sync completed interview");
                    None
                }
            },
        };

        if let Some(session) = synced {
            if session.session_id == self.session.session_id {
                self.session = session;
            }
        }
        self.session.is_complete = true;
        self.view = TextView::Transcription;
        tracing::info!(
            session_id = %self.session.session_id,
            answers = self.session.responses.len(),
            "text interview complete"
        );
    }
}

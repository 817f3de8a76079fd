//! Practice interview wizard: `Setup → Interview → Analysis → Results`

use crate::api::{
    ApiClient, InterviewFeedback, PracticeCompleteRequest, PracticeSession, PracticeStartRequest,
    Question, QuestionResponse,
};
use crate::notice::Notifier;
use crate::{Error, Result};

/// Current step of the practice flow
#[derive(Debug, Clone, PartialEq)]
pub enum PracticeStep {
    Setup,
    Interview {
        session: PracticeSession,
        answers: Vec<QuestionResponse>,
    },
    /// Answers submitted, waiting for feedback
    Analysis {
        session: PracticeSession,
        answers: Vec<QuestionResponse>,
    },
    Results(InterviewFeedback),
}

/// Drives one practice interview
pub struct PracticeFlow {
    api: ApiClient,
    notifier: Notifier,
    language: String,
    step: PracticeStep,
}

impl PracticeFlow {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Notifier, language: impl Into<String>) -> Self {
        Self {
            api,
            notifier,
            language: language.into(),
            step: PracticeStep::Setup,
        }
    }

    #[must_use]
    pub const fn step(&self) -> &PracticeStep {
        &self.step
    }

    /// The question awaiting an answer
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match &self.step {
            PracticeStep::Interview { session, answers } => session.questions.get(answers.len()),
            _ => None,
        }
    }

    /// Start a practice interview for `role`
    ///
    /// # Errors
    ///
    /// Returns error if the flow is not in setup or the request fails; the
    /// flow stays in setup on failure
    pub async fn start(
        &mut self,
        role: &str,
        difficulty: Option<String>,
        question_count: Option<u32>,
    ) -> Result<()> {
        if !matches!(self.step, PracticeStep::Setup) {
            return Err(Error::InvalidState("practice already started".to_string()));
        }
        let role = role.trim();
        if role.is_empty() {
            return Err(Error::Validation("role is required".to_string()));
        }

        let request = PracticeStartRequest {
            role: role.to_string(),
            difficulty,
            question_count,
            language: self.language.clone(),
        };

        let session = match self.api.start_practice(&request).await {
            Ok(session) if session.questions.is_empty() => {
                let e = Error::Api {
                    status: 200,
                    message: "practice session has no questions".to_string(),
                };
                self.notifier.error("Couldn't start practice", e.to_string());
                return Err(e);
            }
            Ok(session) => session,
            Err(e) => {
                self.notifier.error("Couldn't start practice", e.to_string());
                return Err(e);
            }
        };

        self.step = PracticeStep::Interview {
            session,
            answers: Vec::new(),
        };
        Ok(())
    }

    /// Record an answer to the current question
    ///
    /// Returns `true` once every question has an answer.
    ///
    /// # Errors
    ///
    /// Returns error for a blank answer or when no question is pending
    pub fn answer(&mut self, answer: &str) -> Result<bool> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::Validation("answer is empty".to_string()));
        }

        let PracticeStep::Interview { session, answers } = &mut self.step else {
            return Err(Error::InvalidState("no practice interview in progress".to_string()));
        };
        let question = session
            .questions
            .get(answers.len())
            .ok_or_else(|| Error::InvalidState("every question is answered".to_string()))?;

        answers.push(QuestionResponse {
            question: question.text.clone(),
            answer: answer.to_string(),
        });
        Ok(answers.len() >= session.questions.len())
    }

    /// Submit the answers for feedback
    ///
    /// On failure the flow returns to the interview with every answer kept.
    ///
    /// # Errors
    ///
    /// Returns error if no interview is in progress or the request fails
    pub async fn submit(&mut self) -> Result<&InterviewFeedback> {
        let (session, answers) = match std::mem::replace(&mut self.step, PracticeStep::Setup) {
            PracticeStep::Interview { session, answers } if !answers.is_empty() => {
                (session, answers)
            }
            other => {
                self.step = other;
                return Err(Error::InvalidState("nothing to submit".to_string()));
            }
        };

        let request = PracticeCompleteRequest {
            session_id: session.session_id.clone(),
            responses: answers.clone(),
            language: self.language.clone(),
        };
        self.step = PracticeStep::Analysis { session, answers };

        match self.api.complete_practice(&request).await {
            Ok(feedback) => {
                tracing::info!(session_id = %request.session_id, score = ?feedback.score, "practice analyzed");
                self.step = PracticeStep::Results(feedback);
            }
            Err(e) => {
                self.notifier.error("Couldn't analyze practice", e.to_string());
                if let PracticeStep::Analysis { session, answers } =
                    std::mem::replace(&mut self.step, PracticeStep::Setup)
                {
                    self.step = PracticeStep::Interview { session, answers };
                }
                return Err(e);
            }
        }

        match &self.step {
            PracticeStep::Results(feedback) => Ok(feedback),
            _ => Err(Error::InvalidState("practice results missing".to_string())),
        }
    }

    /// Practice again from the results screen
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] outside the results step
    pub fn reset(&mut self) -> Result<()> {
        if !matches!(self.step, PracticeStep::Results(_)) {
            return Err(Error::InvalidState("practice has no results yet".to_string()));
        }
        self.step = PracticeStep::Setup;
        Ok(())
    }
}

//! Interview completion detection

use super::RealtimeEvent;

/// Phrases an interviewer uses when wrapping up
const CLOSING_PHRASES: &[&str] = &[
    "final question",
    "thank you for your time",
    "concludes our interview",
    "end of our interview",
    "that wraps up",
    "we'll be in touch",
];

/// How the end of an interview is recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    /// Only the backend's `interview.completed` event ends the interview
    #[default]
    Structured,
    /// Also treat closing phrases in interviewer transcripts as the end
    ///
    /// Natural-language matching misfires easily; prefer [`Self::Structured`].
    Heuristic,
}

/// Decides whether an event marks the end of the interview
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionDetector {
    policy: CompletionPolicy,
}

impl CompletionDetector {
    #[must_use]
    pub const fn new(policy: CompletionPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    /// Whether `event` completes the interview
    #[must_use]
    pub fn is_completion(&self, event: &RealtimeEvent) -> bool {
        match event {
            RealtimeEvent::InterviewCompleted { .. } => true,
            RealtimeEvent::AssistantTranscriptDone { transcript } => {
                self.policy == CompletionPolicy::Heuristic && matches_closing_phrase(transcript)
            }
            _ => false,
        }
    }
}

/// Whether `text` contains a known closing phrase (case-insensitive)
#[must_use]
pub fn matches_closing_phrase(text: &str) -> bool {
    let lower = text.to_lowercase();
    CLOSING_PHRASES.iter().any(|p| lower.contains(p))
}

//! Conversation history built from transcript events

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::RealtimeEvent;

/// Who spoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The candidate
    User,
    /// The AI interviewer
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "Candidate"),
            Self::Assistant => write!(f, "Interviewer"),
        }
    }
}

/// One finished utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch at arrival
    pub timestamp: i64,
}

/// Ordered, deduplicated conversation history
///
/// Messages are kept in arrival order. A `(role, content)` pair is stored at
/// most once, which suppresses transcripts the vendor delivers twice.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    seen: HashSet<(Role, String)>,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an utterance unless it is blank or already present
    ///
    /// Returns the stored message when one was appended.
    pub fn append(&mut self, role: Role, content: &str, timestamp: i64) -> Option<&ConversationMessage> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }

        if !self.seen.insert((role, content.to_string())) {
            tracing::debug!(%role, "dropping duplicate transcript");
            return None;
        }

        self.messages.push(ConversationMessage {
            role,
            content: content.to_string(),
            timestamp,
        });
        self.messages.last()
    }

    /// Fold one event into the history
    ///
    /// Only transcript completions produce messages; every other event is a no-op.
    pub fn apply(&mut self, event: &RealtimeEvent, timestamp: i64) -> Option<&ConversationMessage> {
        match event {
            RealtimeEvent::UserTranscriptDone { transcript } => {
                self.append(Role::User, transcript, timestamp)
            }
            RealtimeEvent::AssistantTranscriptDone { transcript } => {
                self.append(Role::Assistant, transcript, timestamp)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Plain-text transcript, one line per message
    #[must_use]
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Consume the history
    #[must_use]
    pub fn into_messages(self) -> Vec<ConversationMessage> {
        self.messages
    }
}

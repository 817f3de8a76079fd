//! Realtime vendor events carried over the data channel

use serde::Deserialize;

use crate::Result;

/// Error payload of an `error` event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VendorError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Events the interview session reacts to
///
/// Anything else the vendor sends parses as [`RealtimeEvent::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum RealtimeEvent {
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted,

    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped,

    /// Final transcript of what the candidate said
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    UserTranscriptDone { transcript: String },

    /// Final transcript of what the interviewer said
    #[serde(rename = "response.audio_transcript.done")]
    AssistantTranscriptDone { transcript: String },

    #[serde(rename = "response.done")]
    ResponseDone,

    /// Structured end-of-interview signal emitted by the backend
    #[serde(rename = "interview.completed")]
    InterviewCompleted {
        #[serde(default)]
        reason: Option<String>,
    },

    #[serde(rename = "error")]
    Error { error: VendorError },

    #[serde(other)]
    Unknown,
}

/// Parse one data-channel message
///
/// # Errors
///
/// Returns a serialization error for malformed JSON or a missing `type`
pub fn parse_event(text: &str) -> Result<RealtimeEvent> {
    Ok(serde_json::from_str(text)?)
}

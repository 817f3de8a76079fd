//! Hireflow - client core for a job-seeker recruiting service
//!
//! This library provides:
//! - A typed HTTP client for the recruiting backend
//! - Realtime voice interviews (signaling, transcripts, completion, recording)
//! - Streaming avatar sessions
//! - Practice, text interview, and career insight flows
//! - Profile autosave
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      Flows                          │
//! │  VoiceInterview │ TextInterview │ Practice │ Insights│
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   Media │ Signaling │ Conversation │ Recorder │ Avatar│
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              ApiClient (HTTP / JSON)                │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod avatar;
pub mod config;
pub mod documents;
pub mod error;
pub mod media;
pub mod notice;
pub mod profile;
pub mod realtime;
pub mod recording;
pub mod retry;
pub mod session;

pub use api::ApiClient;
pub use config::Config;
pub use error::{Error, Result};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use profile::ComprehensiveProfile;
pub use session::{InsightsFlow, PracticeFlow, TextInterview, VoiceInterview};

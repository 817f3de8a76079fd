//! Interview and insight flows
//!
//! Each flow is a state machine whose step is a tagged enum. Network
//! failures emit an error notice and return the flow to the step the user
//! acted from; they never leave a flow half-advanced.

mod insights;
mod practice;
mod text;
mod voice;

pub use insights::{InsightResult, InsightsFlow, InsightsStep};
pub use practice::{PracticeFlow, PracticeStep};
pub use text::{TextInterview, TextView};
pub use voice::{CompletionReport, VoiceCapabilities, VoiceInterview, VoiceOptions, VoicePhase};

//! Realtime voice interview plumbing
//!
//! - `signaling`: credential, SDP exchange, and peer connection lifecycle
//! - `events`: typed vendor events from the data channel
//! - `conversation`: ordered, deduplicated transcript history
//! - `completion`: end-of-interview detection

mod completion;
mod conversation;
mod events;
mod signaling;

pub use completion::{CompletionDetector, CompletionPolicy, matches_closing_phrase};
pub use conversation::{Conversation, ConversationMessage, Role};
pub use events::{RealtimeEvent, VendorError, parse_event};
pub use signaling::{ConnectParams, PeerConnection, PeerConnector, SignalingClient};

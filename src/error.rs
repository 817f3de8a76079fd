//! Error types for the hireflow client

use thiserror::Error;

/// Result type alias for hireflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the recruiting backend or running a session
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Input rejected client-side before any network call
    #[error("validation error: {0}")]
    Validation(String),

    /// Camera or microphone access denied
    #[error("permission denied: {0}")]
    Permission(String),

    /// Realtime peer connection could not be established
    #[error("connection error: {0}")]
    Connection(String),

    /// Backend returned a non-success status
    #[error("api error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Realtime or avatar vendor failure
    #[error("vendor error: {0}")]
    Vendor(String),

    /// Recording capture or upload failure
    #[error("recording error: {0}")]
    Recording(String),

    /// Operation not allowed in the current session phase
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// WebSocket transport error
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether retrying the failed operation may succeed
    ///
    /// Rate limits, server errors, and transport-level failures are transient.
    /// Everything else (validation, permissions, 4xx) will fail the same way again.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Api { status, message } => crate::retry::is_recoverable(*status, message),
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::WebSocket(_) | Self::Vendor(_) => true,
            _ => false,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(e.to_string())
    }
}

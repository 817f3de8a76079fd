//! User-facing notices
//!
//! Flows never surface failures by panicking or propagating past their own
//! boundary; instead they emit a [`Notice`] for the embedding UI to show as a
//! toast and roll back to the previous interactive state.

use tokio::sync::mpsc;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational
    Info,
    /// Non-blocking warning, the flow continues
    Warning,
    /// An action failed and was rolled back
    Error,
}

/// A toast-style message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Short headline
    pub title: String,
    /// Detail text
    pub message: String,
}

/// Sends notices to whoever is listening
///
/// Cloning is cheap; a disabled notifier only logs.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    /// Create a notifier and the receiving end for the UI
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Notifier that only logs
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Emit an informational notice
    pub fn info(&self, title: &str, message: impl Into<String>) {
        self.emit(NoticeLevel::Info, title, message.into());
    }

    /// Emit a warning notice
    pub fn warn(&self, title: &str, message: impl Into<String>) {
        self.emit(NoticeLevel::Warning, title, message.into());
    }

    /// Emit an error notice
    pub fn error(&self, title: &str, message: impl Into<String>) {
        self.emit(NoticeLevel::Error, title, message.into());
    }

    fn emit(&self, level: NoticeLevel, title: &str, message: String) {
        match level {
            NoticeLevel::Info => tracing::info!(title, %message, "notice"),
            NoticeLevel::Warning => tracing::warn!(title, %message, "notice"),
            NoticeLevel::Error => tracing::error!(title, %message, "notice"),
        }

        if let Some(tx) = &self.tx {
            // Receiver gone means the UI closed; nothing left to tell
            let _ = tx.send(Notice {
                level,
                title: title.to_string(),
                message,
            });
        }
    }
}

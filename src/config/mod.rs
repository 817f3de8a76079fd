//! Configuration management for the hireflow client
//!
//! Values resolve with priority env > TOML file > default.

pub mod file;

use std::time::Duration;

use secrecy::SecretString;

use crate::realtime::CompletionPolicy;
use crate::retry::{Backoff, RetryPolicy};
use crate::{Error, Result};

use file::HireflowConfigFile;

/// Default backend URL for local development
const DEFAULT_API_URL: &str = "http://localhost:5000";

/// hireflow client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API connection
    pub api: ApiConfig,

    /// Language code sent with analysis and interview requests
    pub language: String,

    /// Profile autosave timing
    pub autosave: AutosaveConfig,

    /// Interview recording
    pub recording: RecordingConfig,

    /// Realtime voice session
    pub realtime: RealtimeConfig,

    /// Avatar vendor connection
    pub avatar: AvatarConfig,
}

/// Backend API connection
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, without trailing slash
    pub base_url: String,

    /// Bearer token (from `HIREFLOW_API_TOKEN`)
    pub token: Option<SecretString>,

    /// Per-request timeout
    pub timeout: Duration,
}

/// Profile autosave timing
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiet period after the last edit before saving
    pub debounce: Duration,

    /// Fallback interval that saves unsaved edits regardless of activity
    pub interval: Duration,
}

/// Interview recording
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Record voice interviews
    pub enabled: bool,

    /// Encoder timeslice; each chunk covers this much media
    pub chunk_interval: Duration,

    /// Retry policy for individual chunk uploads
    pub upload_retry: RetryPolicy,

    /// How long stopping a recording waits for queued chunks to upload
    pub drain_timeout: Duration,
}

/// Realtime voice session
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// How long to wait for the remote audio track after applying the answer
    pub remote_track_timeout: Duration,

    /// Interviewer voice requested from the backend
    pub voice: Option<String>,

    /// How interview completion is detected
    pub completion: CompletionPolicy,
}

/// Avatar vendor connection
#[derive(Debug, Clone)]
pub struct AvatarConfig {
    /// Retry policy for the avatar WebSocket
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                token: None,
                timeout: Duration::from_secs(60),
            },
            language: "en".to_string(),
            autosave: AutosaveConfig {
                debounce: Duration::from_secs(10),
                interval: Duration::from_secs(10),
            },
            recording: RecordingConfig {
                enabled: true,
                chunk_interval: Duration::from_secs(10),
                upload_retry: RetryPolicy::default(),
                drain_timeout: Duration::from_secs(30),
            },
            realtime: RealtimeConfig {
                remote_track_timeout: Duration::from_secs(10),
                voice: None,
                completion: CompletionPolicy::Structured,
            },
            avatar: AvatarConfig {
                retry: RetryPolicy::avatar(),
            },
        }
    }
}

impl Config {
    /// Load configuration from the environment and the standard config file
    ///
    /// # Errors
    ///
    /// Returns error if the config file is malformed or a resolved value is
    /// invalid (e.g. a malformed base URL)
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file()?;
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a resolved value is invalid
    pub fn resolve(fc: HireflowConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let base_url = env("HIREFLOW_API_URL")
            .or(fc.api.base_url)
            .unwrap_or(defaults.api.base_url);
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid api base url {base_url:?}: {e}")))?;

        let token = env("HIREFLOW_API_TOKEN")
            .or(fc.api.token)
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        let timeout = env("HIREFLOW_API_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .or(fc.api.timeout_secs)
            .map_or(defaults.api.timeout, Duration::from_secs);

        let language = env("HIREFLOW_LANGUAGE")
            .or(fc.language)
            .unwrap_or(defaults.language);

        let autosave = AutosaveConfig {
            debounce: fc
                .autosave
                .debounce_secs
                .map_or(defaults.autosave.debounce, Duration::from_secs),
            interval: fc
                .autosave
                .interval_secs
                .map_or(defaults.autosave.interval, Duration::from_secs),
        };
        if autosave.debounce.is_zero() {
            return Err(Error::Config("autosave.debounce_secs must be positive".to_string()));
        }
        if autosave.interval.is_zero() {
            return Err(Error::Config("autosave.interval_secs must be positive".to_string()));
        }

        let recording = RecordingConfig {
            enabled: env("HIREFLOW_RECORDING")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .or(fc.recording.enabled)
                .unwrap_or(defaults.recording.enabled),
            chunk_interval: fc
                .recording
                .chunk_secs
                .map_or(defaults.recording.chunk_interval, Duration::from_secs),
            upload_retry: RetryPolicy {
                max_attempts: fc
                    .recording
                    .upload_attempts
                    .unwrap_or(defaults.recording.upload_retry.max_attempts),
                ..defaults.recording.upload_retry
            },
            drain_timeout: fc
                .recording
                .drain_secs
                .map_or(defaults.recording.drain_timeout, Duration::from_secs),
        };
        if recording.chunk_interval.is_zero() {
            return Err(Error::Config("recording.chunk_secs must be positive".to_string()));
        }

        let heuristic = fc.realtime.heuristic_completion.unwrap_or(false);
        let realtime = RealtimeConfig {
            remote_track_timeout: fc
                .realtime
                .remote_track_timeout_secs
                .map_or(defaults.realtime.remote_track_timeout, Duration::from_secs),
            voice: env("HIREFLOW_VOICE").or(fc.realtime.voice),
            completion: if heuristic {
                CompletionPolicy::Heuristic
            } else {
                CompletionPolicy::Structured
            },
        };

        let avatar = AvatarConfig {
            retry: RetryPolicy {
                max_attempts: fc
                    .avatar
                    .max_attempts
                    .unwrap_or(defaults.avatar.retry.max_attempts),
                base_delay: fc
                    .avatar
                    .retry_base_secs
                    .map_or(defaults.avatar.retry.base_delay, Duration::from_secs),
                backoff: Backoff::Linear,
                ..defaults.avatar.retry
            },
        };

        Ok(Self {
            api: ApiConfig {
                base_url,
                token,
                timeout,
            },
            language,
            autosave,
            recording,
            realtime,
            avatar,
        })
    }
}

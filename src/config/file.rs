//! TOML configuration file loading
//!
//! Supports `~/.config/hireflow/config.toml` as a persistent config source.
//! All fields are optional, the file is a partial overlay on top of defaults.
//! A file that exists but doesn't parse is an error rather than silently ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct HireflowConfigFile {
    /// Preferred language for generated insights and interviews (e.g. "en")
    #[serde(default)]
    pub language: Option<String>,

    /// Backend API configuration
    #[serde(default)]
    pub api: ApiFileConfig,

    /// Profile autosave timing
    #[serde(default)]
    pub autosave: AutosaveFileConfig,

    /// Interview recording
    #[serde(default)]
    pub recording: RecordingFileConfig,

    /// Realtime voice session
    #[serde(default)]
    pub realtime: RealtimeFileConfig,

    /// Avatar vendor connection
    #[serde(default)]
    pub avatar: AvatarFileConfig,
}

/// Backend API configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiFileConfig {
    /// Base URL of the recruiting backend
    pub base_url: Option<String>,

    /// Bearer token sent with every request
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Profile autosave timing
#[derive(Debug, Default, Deserialize)]
pub struct AutosaveFileConfig {
    pub debounce_secs: Option<u64>,
    pub interval_secs: Option<u64>,
}

/// Interview recording
#[derive(Debug, Default, Deserialize)]
pub struct RecordingFileConfig {
    /// Record interviews at all
    pub enabled: Option<bool>,

    /// Length of each uploaded chunk in seconds
    pub chunk_secs: Option<u64>,

    /// Attempts per chunk upload
    pub upload_attempts: Option<u32>,

    /// How long stopping waits for queued chunks, in seconds
    pub drain_secs: Option<u64>,
}

/// Realtime voice session
#[derive(Debug, Default, Deserialize)]
pub struct RealtimeFileConfig {
    /// How long to wait for the remote audio track
    pub remote_track_timeout_secs: Option<u64>,

    /// Voice identifier requested for the interviewer
    pub voice: Option<String>,

    /// Infer interview completion from closing phrases in transcripts
    pub heuristic_completion: Option<bool>,
}

/// Avatar vendor connection
#[derive(Debug, Default, Deserialize)]
pub struct AvatarFileConfig {
    pub max_attempts: Option<u32>,
    pub retry_base_secs: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `HireflowConfigFile::default()` if the file doesn't exist.
///
/// # Errors
///
/// Returns error if the file exists but can't be read or parsed
pub fn load_config_file() -> Result<HireflowConfigFile> {
    let Some(path) = config_file_path() else {
        return Ok(HireflowConfigFile::default());
    };

    load_config_file_from(&path)
}

/// Load a config file from an explicit path, falling back to defaults when absent
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the file can't be read and
/// [`Error::Toml`](crate::Error::Toml) if it isn't valid TOML
pub fn load_config_file_from(path: &Path) -> Result<HireflowConfigFile> {
    if !path.exists() {
        return Ok(HireflowConfigFile::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: HireflowConfigFile = toml::from_str(&content).inspect_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to parse config file");
    })?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/hireflow/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("hireflow").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let fc: HireflowConfigFile = toml::from_str(
            r#"
            language = "de"

            [api]
            base_url = "https://jobs.example.com"

            [realtime]
            heuristic_completion = true
            "#,
        )
        .unwrap();

        assert_eq!(fc.language.as_deref(), Some("de"));
        assert_eq!(fc.api.base_url.as_deref(), Some("https://jobs.example.com"));
        assert!(fc.api.token.is_none());
        assert_eq!(fc.realtime.heuristic_completion, Some(true));
        assert!(fc.autosave.debounce_secs.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_config_file_from(&dir.path().join("nope.toml")).unwrap();
        assert!(fc.api.base_url.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is [not toml").unwrap();

        let err = load_config_file_from(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Toml(_)));
    }

    #[test]
    fn mistyped_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recording]\nchunk_secs = \"ten\"\n").unwrap();

        assert!(matches!(
            load_config_file_from(&path),
            Err(crate::Error::Toml(_))
        ));
    }
}

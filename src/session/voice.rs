//! Realtime voice interview orchestration
//!
//! A [`VoiceInterview`] moves through
//! `Idle → Acquiring → Connecting → Live → Closing → Closed`.
//! Each phase owns exactly the resources valid in it, so a recorder without
//! a stream (or a live connection after close) cannot be represented.
//! Resources stay in the phase across every await, so [`VoiceInterview::abort`]
//! (and `Drop`) release them even when `start` or `finish` is cancelled
//! midway.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, CompleteVoiceRequest, CompleteVoiceResponse};
use crate::config::Config;
use crate::media::{self, MediaDevices, MediaStream};
use crate::notice::Notifier;
use crate::realtime::{
    CompletionDetector, CompletionPolicy, ConnectParams, Conversation, ConversationMessage,
    PeerConnector, RealtimeEvent, SignalingClient, parse_event,
};
use crate::recording::{ChunkUploader, MediaEncoder, Recorder, RecorderConfig, RecordingResult};
use crate::{Error, Result};

/// Observable phase of a voice interview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePhase {
    Idle,
    Acquiring,
    Connecting,
    Live,
    Closing,
    Closed,
}

/// External capabilities the interview drives
#[derive(Clone)]
pub struct VoiceCapabilities {
    pub devices: Arc<dyn MediaDevices>,
    pub peer: Arc<dyn PeerConnector>,
    /// `None` disables recording
    pub encoder: Option<Arc<dyn MediaEncoder>>,
}

/// Per-interview settings
#[derive(Debug, Clone)]
pub struct VoiceOptions {
    pub session_id: String,
    pub language: String,
    /// Ask for the camera as well as the microphone
    pub want_video: bool,
    pub instructions: Option<String>,
    pub voice: Option<String>,
    pub completion: CompletionPolicy,
    pub remote_track_timeout: Duration,
    /// End the interview automatically after this long
    pub max_duration: Option<Duration>,
    /// Record when an encoder is available
    pub record: bool,
    pub recorder: RecorderConfig,
}

impl VoiceOptions {
    /// Options for `session_id` taken from the loaded configuration
    #[must_use]
    pub fn from_config(config: &Config, session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            language: config.language.clone(),
            want_video: true,
            instructions: None,
            voice: config.realtime.voice.clone(),
            completion: config.realtime.completion,
            remote_track_timeout: config.realtime.remote_track_timeout,
            max_duration: None,
            record: config.recording.enabled,
            recorder: RecorderConfig::from(&config.recording),
        }
    }
}

/// What an interview produced
#[derive(Debug, Clone)]
pub struct CompletionReport {
    pub session_id: String,
    pub conversation: Vec<ConversationMessage>,
    /// `None` when recording was disabled or never started
    pub recording: Option<RecordingResult>,
    pub audio_only: bool,
    /// Server analysis; `None` if submission failed
    pub analysis: Option<CompleteVoiceResponse>,
}

struct LiveSession {
    local: MediaStream,
    remote: MediaStream,
    audio_only: bool,
    recorder: Option<Recorder>,
}

impl LiveSession {
    /// Stop the recorder without finalizing and release every track
    fn release(&mut self) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.cleanup();
        }
        self.local.stop_all();
        self.remote.stop_all();
    }
}

enum Phase {
    Idle,
    Acquiring,
    /// Holds the local stream until the voice connection is up
    Connecting(MediaStream),
    Live(Box<LiveSession>),
    /// Finalizing; the session is released once finalization is done
    Closing(Box<LiveSession>),
    Closed,
}

/// One realtime voice interview
pub struct VoiceInterview {
    api: ApiClient,
    caps: VoiceCapabilities,
    options: VoiceOptions,
    notifier: Notifier,
    signaling: SignalingClient,
    detector: CompletionDetector,
    conversation: Conversation,
    phase: Phase,
}

impl VoiceInterview {
    #[must_use]
    pub fn new(
        api: ApiClient,
        caps: VoiceCapabilities,
        options: VoiceOptions,
        notifier: Notifier,
    ) -> Self {
        let signaling = SignalingClient::new(
            api.clone(),
            Arc::clone(&caps.peer),
            options.remote_track_timeout,
        );
        Self {
            api,
            detector: CompletionDetector::new(options.completion),
            caps,
            options,
            notifier,
            signaling,
            conversation: Conversation::new(),
            phase: Phase::Idle,
        }
    }

    #[must_use]
    pub fn phase(&self) -> VoicePhase {
        match &self.phase {
            Phase::Idle => VoicePhase::Idle,
            Phase::Acquiring => VoicePhase::Acquiring,
            Phase::Connecting(_) => VoicePhase::Connecting,
            Phase::Live(_) => VoicePhase::Live,
            Phase::Closing(_) => VoicePhase::Closing,
            Phase::Closed => VoicePhase::Closed,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.options.session_id
    }

    /// Conversation so far
    #[must_use]
    pub fn conversation(&self) -> &[ConversationMessage] {
        self.conversation.messages()
    }

    /// Whether the camera was unavailable and the interview runs audio only
    #[must_use]
    pub fn is_audio_only(&self) -> bool {
        matches!(&self.phase, Phase::Live(live) if live.audio_only)
    }

    /// Whether a recorder is capturing this interview
    #[must_use]
    pub fn is_recording(&self) -> bool {
        matches!(&self.phase, Phase::Live(live) if live.recorder.as_ref().is_some_and(Recorder::is_recording))
    }

    /// Acquire media, connect to the interviewer, and start recording
    ///
    /// On failure the interview returns to `Idle`, every acquired track is
    /// stopped, and an error notice is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Permission`] without a microphone,
    /// [`Error::Connection`] if the voice connection fails, or
    /// [`Error::InvalidState`] unless the interview is `Idle`
    pub async fn start(&mut self) -> Result<()> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(Error::InvalidState("voice interview already started".to_string()));
        }

        self.phase = Phase::Acquiring;
        let acquired = match media::acquire(
            self.caps.devices.as_ref(),
            self.options.want_video,
            &self.notifier,
        )
        .await
        {
            Ok(acquired) => acquired,
            Err(e) => {
                self.phase = Phase::Idle;
                self.notifier
                    .error("Microphone unavailable", format!("Could not access your microphone: {e}"));
                return Err(e);
            }
        };

        self.phase = Phase::Connecting(acquired.stream.clone());
        let params = ConnectParams {
            local: acquired.stream.clone(),
            language: self.options.language.clone(),
            instructions: self.options.instructions.clone(),
            voice: self.options.voice.clone(),
        };
        let remote = match self.signaling.connect(&params).await {
            Ok(remote) => remote,
            Err(e) => {
                acquired.stream.stop_all();
                self.phase = Phase::Idle;
                self.notifier
                    .error("Connection failed", format!("Could not reach the interviewer: {e}"));
                return Err(e);
            }
        };

        let recorder = self.start_recorder(&acquired.stream, &remote).await;

        tracing::info!(
            session_id = %self.options.session_id,
            audio_only = acquired.audio_only,
            recording = recorder.is_some(),
            "voice interview live"
        );

        self.phase = Phase::Live(Box::new(LiveSession {
            local: acquired.stream,
            remote,
            audio_only: acquired.audio_only,
            recorder,
        }));
        Ok(())
    }

    /// Recording needs both the local stream and the interviewer's audio
    async fn start_recorder(&self, local: &MediaStream, remote: &MediaStream) -> Option<Recorder> {
        if !self.options.record {
            tracing::debug!(session_id = %self.options.session_id, "recording disabled");
            return None;
        }
        let encoder = self.caps.encoder.as_ref()?;
        let uploader: Arc<dyn ChunkUploader> = Arc::new(self.api.clone());
        let mut recorder = Recorder::new(
            Arc::clone(encoder),
            uploader,
            self.options.recorder.clone(),
        );

        match recorder
            .start_recording(local, &self.options.session_id, Some(remote))
            .await
        {
            Ok(()) => Some(recorder),
            Err(e) => {
                self.notifier.warn(
                    "Recording unavailable",
                    format!("The interview continues without a recording: {e}"),
                );
                None
            }
        }
    }

    /// Handle one data-channel message
    ///
    /// Returns `true` when the message ends the interview. Malformed and
    /// unknown messages are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the interview is live
    pub fn handle_event(&mut self, raw: &str) -> Result<bool> {
        if !matches!(self.phase, Phase::Live(_)) {
            return Err(Error::InvalidState("voice interview is not live".to_string()));
        }

        let event = match parse_event(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed realtime event");
                return Ok(false);
            }
        };

        match &event {
            RealtimeEvent::SpeechStarted => tracing::trace!("candidate started speaking"),
            RealtimeEvent::SpeechStopped => tracing::trace!("candidate stopped speaking"),
            RealtimeEvent::Error { error } => {
                tracing::warn!(code = ?error.code, message = %error.message, "realtime vendor error");
                self.notifier.error("Interviewer error", error.message.clone());
            }
            _ => {}
        }

        let now = chrono::Utc::now().timestamp_millis();
        if let Some(message) = self.conversation.apply(&event, now) {
            tracing::debug!(role = %message.role, chars = message.content.len(), "transcript appended");
        }

        let completed = self.detector.is_completion(&event);
        if completed {
            tracing::info!(session_id = %self.options.session_id, "interview completion detected");
        }
        Ok(completed)
    }

    /// Process events until the interview completes, the channel closes, or
    /// `max_duration` elapses, then [`finish`](Self::finish)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the interview is live
    pub async fn run(&mut self) -> Result<CompletionReport> {
        if !matches!(self.phase, Phase::Live(_)) {
            return Err(Error::InvalidState("voice interview is not live".to_string()));
        }

        let deadline = self
            .options
            .max_duration
            .map(|d| tokio::time::Instant::now() + d);

        loop {
            let next = match deadline {
                Some(at) => {
                    if let Ok(next) = tokio::time::timeout_at(at, self.signaling.next_message()).await {
                        next
                    } else {
                        tracing::info!(session_id = %self.options.session_id, "interview time limit reached");
                        break;
                    }
                }
                None => self.signaling.next_message().await,
            };

            let Some(raw) = next else {
                tracing::info!(session_id = %self.options.session_id, "realtime channel closed");
                break;
            };

            if self.handle_event(&raw)? {
                break;
            }
        }

        self.finish().await
    }

    /// End the interview and submit it
    ///
    /// Disconnects, finalizes the recording, stops every track, and submits
    /// the conversation. Recording and submission failures are reported via
    /// notices and the returned report; they do not fail this call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the interview is live
    pub async fn finish(&mut self) -> Result<CompletionReport> {
        match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Live(live) => self.phase = Phase::Closing(live),
            other => {
                self.phase = other;
                return Err(Error::InvalidState("voice interview is not live".to_string()));
            }
        }

        self.signaling.disconnect();

        let recording = match &mut self.phase {
            Phase::Closing(live) => match live.recorder.as_mut() {
                Some(recorder) => Some(recorder.stop_recording().await),
                None => None,
            },
            _ => None,
        };
        if let Some(result) = recording.as_ref().filter(|r| !r.success) {
            self.notifier.warn(
                "Recording incomplete",
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| "The recording could not be saved.".to_string()),
            );
        }

        let audio_only = match &mut self.phase {
            Phase::Closing(live) => {
                live.local.stop_all();
                live.remote.stop_all();
                live.audio_only
            }
            _ => false,
        };

        let conversation = std::mem::take(&mut self.conversation).into_messages();
        let request = CompleteVoiceRequest {
            session_id: self.options.session_id.clone(),
            conversation: conversation.clone(),
            recording: recording.clone(),
            audio_only,
        };

        let analysis = match self.api.complete_voice_interview(&request).await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::error!(session_id = %self.options.session_id, error = %e, "failed to submit voice interview");
                self.notifier.error(
                    "Couldn't submit interview",
                    format!("Your answers were not analyzed: {e}"),
                );
                None
            }
        };

        self.phase = Phase::Closed;
        tracing::info!(
            session_id = %self.options.session_id,
            messages = conversation.len(),
            submitted = analysis.is_some(),
            "voice interview finished"
        );

        Ok(CompletionReport {
            session_id: self.options.session_id.clone(),
            conversation,
            recording,
            audio_only,
            analysis,
        })
    }

    /// Tear everything down without submitting
    ///
    /// Safe to call from any exit path and any number of times. Returns
    /// `false` when there was nothing to tear down.
    pub fn abort(&mut self) -> bool {
        let released = match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Connecting(local) => {
                local.stop_all();
                true
            }
            Phase::Live(mut live) | Phase::Closing(mut live) => {
                live.release();
                true
            }
            Phase::Idle | Phase::Acquiring | Phase::Closed => false,
        };
        self.signaling.disconnect();
        if released {
            tracing::info!(session_id = %self.options.session_id, "voice interview aborted");
        }
        released
    }
}

impl Drop for VoiceInterview {
    fn drop(&mut self) {
        self.abort();
    }
}

//! Interview recording
//!
//! A [`MediaEncoder`] turns the local stream (optionally mixed with the
//! interviewer's audio) into timed chunks. The [`Recorder`] uploads each
//! chunk as it arrives and, on stop, asks the server to build the playback
//! manifest. Stopping never fails; problems are reported in the
//! [`RecordingResult`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, ChunkUploadResponse, RecordingChunk};
use crate::config::RecordingConfig;
use crate::media::MediaStream;
use crate::retry::{RetryPolicy, with_retry};
use crate::{Error, Result};

const DEFAULT_MIME_TYPE: &str = "video/webm";

/// One encoded piece of the recording
#[derive(Clone)]
pub struct MediaChunk {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl std::fmt::Debug for MediaChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaChunk")
            .field("bytes", &self.data.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Encodes streams into timed chunks
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Begin encoding. A chunk is emitted every `timeslice`.
    async fn start(
        &self,
        stream: &MediaStream,
        mix_audio: Option<&MediaStream>,
        timeslice: Duration,
    ) -> Result<mpsc::Receiver<MediaChunk>>;

    /// Emit the last partial chunk and close the chunk channel
    async fn stop(&self) -> Result<()>;

    /// Stop immediately, discarding buffered media
    fn abort(&self);
}

/// Destination for recording chunks
#[async_trait]
pub trait ChunkUploader: Send + Sync {
    async fn upload_chunk(&self, chunk: &RecordingChunk) -> Result<ChunkUploadResponse>;
}

#[async_trait]
impl ChunkUploader for ApiClient {
    async fn upload_chunk(&self, chunk: &RecordingChunk) -> Result<ChunkUploadResponse> {
        self.upload_recording_chunk(chunk).await
    }
}

/// Outcome of a recording, produced once by [`Recorder::stop_recording`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordingResult {
    #[must_use]
    pub const fn ok(playlist_url: Option<String>) -> Self {
        Self {
            success: true,
            playlist_url,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            playlist_url: None,
            error: Some(error.into()),
        }
    }
}

/// Recorder tuning
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Length of each encoded chunk
    pub timeslice: Duration,
    /// Retry policy for each chunk upload
    pub retry: RetryPolicy,
    /// How long stopping waits for queued chunks to upload
    pub drain_timeout: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            timeslice: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&RecordingConfig> for RecorderConfig {
    fn from(config: &RecordingConfig) -> Self {
        Self {
            timeslice: config.chunk_interval,
            retry: config.upload_retry.clone(),
            drain_timeout: config.drain_timeout,
        }
    }
}

#[derive(Debug, Default)]
struct UploadSummary {
    uploaded: u32,
    failed: u32,
    last_error: Option<String>,
    mime_type: Option<String>,
}

enum RecorderState {
    Idle,
    Recording {
        session_id: String,
        task: JoinHandle<UploadSummary>,
    },
    Finished(RecordingResult),
}

/// Records one interview session
pub struct Recorder {
    encoder: Arc<dyn MediaEncoder>,
    uploader: Arc<dyn ChunkUploader>,
    config: RecorderConfig,
    state: RecorderState,
}

impl Recorder {
    #[must_use]
    pub fn new(
        encoder: Arc<dyn MediaEncoder>,
        uploader: Arc<dyn ChunkUploader>,
        config: RecorderConfig,
    ) -> Self {
        Self {
            encoder,
            uploader,
            config,
            state: RecorderState::Idle,
        }
    }

    /// Whether chunks are currently being captured
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// Start recording `stream`, mixing in `mix_audio` when given
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if this recorder was already started,
    /// or [`Error::Recording`] if the stream is not live or the encoder fails
    pub async fn start_recording(
        &mut self,
        stream: &MediaStream,
        session_id: &str,
        mix_audio: Option<&MediaStream>,
    ) -> Result<()> {
        if !matches!(self.state, RecorderState::Idle) {
            return Err(Error::InvalidState("recorder already used".to_string()));
        }
        if !stream.is_active() {
            return Err(Error::Recording("stream has no live tracks".to_string()));
        }

        let rx = self
            .encoder
            .start(stream, mix_audio, self.config.timeslice)
            .await
            .map_err(|e| Error::Recording(format!("encoder failed to start: {e}")))?;

        let task = tokio::spawn(upload_chunks(
            Arc::clone(&self.uploader),
            self.config.retry.clone(),
            session_id.to_string(),
            rx,
        ));

        tracing::info!(
            session_id,
            mixed = mix_audio.is_some(),
            timeslice_secs = self.config.timeslice.as_secs(),
            "recording started"
        );

        self.state = RecorderState::Recording {
            session_id: session_id.to_string(),
            task,
        };
        Ok(())
    }

    /// Finish the recording and request the playback manifest
    ///
    /// Waits for in-flight uploads up to the configured drain timeout. Any
    /// failure is returned as `RecordingResult { success: false, .. }`.
    /// Calling again returns the same result. Until this returns the
    /// recorder stays in the recording state, so a cancelled stop can still
    /// be cleaned up.
    pub async fn stop_recording(&mut self) -> RecordingResult {
        let (session_id, task) = match &mut self.state {
            RecorderState::Recording { session_id, task } => (session_id.clone(), task),
            RecorderState::Finished(result) => return result.clone(),
            RecorderState::Idle => {
                let result = RecordingResult::failed("recording was not started");
                self.state = RecorderState::Finished(result.clone());
                return result;
            }
        };

        let drained = drain(
            self.encoder.as_ref(),
            task,
            self.config.drain_timeout,
            &session_id,
        )
        .await;
        let result = match drained {
            Ok(summary) => self.finalize(&session_id, summary).await,
            Err(result) => result,
        };

        if result.success {
            tracing::info!(%session_id, playlist_url = ?result.playlist_url, "recording finalized");
        } else {
            tracing::warn!(%session_id, error = ?result.error, "recording finalization failed");
        }

        self.state = RecorderState::Finished(result.clone());
        result
    }

    async fn finalize(&self, session_id: &str, summary: UploadSummary) -> RecordingResult {
        if summary.failed > 0 {
            return RecordingResult::failed(format!(
                "{} of {} chunks failed to upload: {}",
                summary.failed,
                summary.uploaded + summary.failed,
                summary.last_error.unwrap_or_default()
            ));
        }

        let marker = RecordingChunk {
            session_id: session_id.to_string(),
            index: summary.uploaded,
            is_final: true,
            mime_type: summary
                .mime_type
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            data: Vec::new(),
        };

        let uploader = &self.uploader;
        match with_retry(&self.config.retry, "finalize recording", Error::is_recoverable, || {
            uploader.upload_chunk(&marker)
        })
        .await
        {
            Ok(response) if response.success == Some(false) => {
                RecordingResult::failed("server rejected recording finalization")
            }
            Ok(response) => RecordingResult::ok(response.playlist_url),
            Err(e) => RecordingResult::failed(format!("failed to finalize recording: {e}")),
        }
    }

    /// Abort recording without finalizing
    ///
    /// Returns `false` when there was nothing to abort.
    pub fn cleanup(&mut self) -> bool {
        match std::mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Recording { session_id, task } => {
                self.encoder.abort();
                task.abort();
                tracing::debug!(%session_id, "recording aborted");
                self.state = RecorderState::Finished(RecordingResult::failed("recording aborted"));
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Stop the encoder and wait for the upload task to empty the chunk channel
///
/// Gives up after `limit`, aborting both the encoder and the upload task.
async fn drain(
    encoder: &dyn MediaEncoder,
    task: &mut JoinHandle<UploadSummary>,
    limit: Duration,
    session_id: &str,
) -> std::result::Result<UploadSummary, RecordingResult> {
    let drained = tokio::time::timeout(limit, async {
        if let Err(e) = encoder.stop().await {
            tracing::warn!(session_id, error = %e, "encoder did not stop cleanly");
            // closes the chunk channel so the upload task can finish
            encoder.abort();
        }
        (&mut *task).await
    })
    .await;

    match drained {
        Ok(Ok(summary)) => Ok(summary),
        Ok(Err(e)) => Err(RecordingResult::failed(format!("upload task failed: {e}"))),
        Err(_) => {
            encoder.abort();
            task.abort();
            Err(RecordingResult::failed(format!(
                "uploads did not finish within {}s",
                limit.as_secs_f32()
            )))
        }
    }
}

async fn upload_chunks(
    uploader: Arc<dyn ChunkUploader>,
    retry: RetryPolicy,
    session_id: String,
    mut rx: mpsc::Receiver<MediaChunk>,
) -> UploadSummary {
    let mut summary = UploadSummary::default();
    let mut index = 0u32;

    while let Some(chunk) = rx.recv().await {
        if chunk.data.is_empty() {
            continue;
        }

        let request = RecordingChunk {
            session_id: session_id.clone(),
            index,
            is_final: false,
            mime_type: chunk.mime_type,
            data: chunk.data,
        };
        index += 1;

        let result = with_retry(&retry, "upload recording chunk", Error::is_recoverable, || {
            uploader.upload_chunk(&request)
        })
        .await;

        match result {
            Ok(_) => {
                summary.uploaded += 1;
                tracing::debug!(%session_id, index = request.index, bytes = request.data.len(), "chunk uploaded");
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(%session_id, index = request.index, error = %e, "chunk upload failed");
                summary.last_error = Some(e.to_string());
            }
        }
        summary.mime_type = Some(request.mime_type);
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::media::{MediaTrack, TrackKind};

    use super::*;

    struct FakeEncoder {
        chunks: Vec<&'static [u8]>,
        fail_start: bool,
        /// `stop` reports success but never closes the chunk channel
        stuck_open: bool,
        tx: Mutex<Option<mpsc::Sender<MediaChunk>>>,
    }

    impl FakeEncoder {
        fn new(chunks: Vec<&'static [u8]>) -> Self {
            Self {
                chunks,
                fail_start: false,
                stuck_open: false,
                tx: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl MediaEncoder for FakeEncoder {
        async fn start(
            &self,
            _stream: &MediaStream,
            _mix_audio: Option<&MediaStream>,
            _timeslice: Duration,
        ) -> Result<mpsc::Receiver<MediaChunk>> {
            if self.fail_start {
                return Err(Error::Recording("no codec".to_string()));
            }
            let (tx, rx) = mpsc::channel(16);
            for data in &self.chunks {
                tx.try_send(MediaChunk {
                    data: data.to_vec(),
                    mime_type: "video/webm".to_string(),
                })
                .unwrap();
            }
            *self.tx.lock().unwrap() = Some(tx);
            Ok(rx)
        }

        async fn stop(&self) -> Result<()> {
            if !self.stuck_open {
                self.tx.lock().unwrap().take();
            }
            Ok(())
        }

        fn abort(&self) {
            self.tx.lock().unwrap().take();
        }
    }

    #[derive(Default)]
    struct FakeUploader {
        received: Mutex<Vec<(u32, bool, usize)>>,
        failures_before_success: Mutex<u32>,
        reject_status: Option<u16>,
    }

    #[async_trait]
    impl ChunkUploader for FakeUploader {
        async fn upload_chunk(&self, chunk: &RecordingChunk) -> Result<ChunkUploadResponse> {
            if let Some(status) = self.reject_status {
                return Err(Error::Api {
                    status,
                    message: "rejected".to_string(),
                });
            }
            {
                let mut remaining = self.failures_before_success.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(Error::Api {
                        status: 503,
                        message: "busy".to_string(),
                    });
                }
            }
            self.received
                .lock()
                .unwrap()
                .push((chunk.index, chunk.is_final, chunk.data.len()));
            Ok(ChunkUploadResponse {
                success: Some(true),
                playlist_url: chunk
                    .is_final
                    .then(|| format!("/recordings/{}/playlist.m3u8", chunk.session_id)),
            })
        }
    }

    fn stream() -> MediaStream {
        MediaStream::new(vec![
            MediaTrack::new(TrackKind::Audio),
            MediaTrack::new(TrackKind::Video),
        ])
    }

    fn recorder(encoder: FakeEncoder, uploader: &Arc<FakeUploader>) -> Recorder {
        Recorder::new(
            Arc::new(encoder),
            Arc::clone(uploader) as Arc<dyn ChunkUploader>,
            RecorderConfig::default(),
        )
    }

    #[tokio::test]
    async fn uploads_chunks_then_final_marker() {
        let uploader = Arc::new(FakeUploader::default());
        let mut rec = recorder(FakeEncoder::new(vec![b"aaaa", b"bb"]), &uploader);

        rec.start_recording(&stream(), "s1", None).await.unwrap();
        assert!(rec.is_recording());

        let result = rec.stop_recording().await;
        assert!(result.success);
        assert_eq!(
            result.playlist_url.as_deref(),
            Some("/recordings/s1/playlist.m3u8")
        );

        let received = uploader.received.lock().unwrap().clone();
        assert_eq!(received, vec![(0, false, 4), (1, false, 2), (2, true, 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_upload_failures_are_retried() {
        let uploader = Arc::new(FakeUploader {
            failures_before_success: Mutex::new(2),
            ..FakeUploader::default()
        });
        let mut rec = recorder(FakeEncoder::new(vec![b"abc"]), &uploader);

        rec.start_recording(&stream(), "s2", None).await.unwrap();
        let result = rec.stop_recording().await;

        assert!(result.success);
        assert_eq!(uploader.received.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn upload_failure_resolves_with_error() {
        let uploader = Arc::new(FakeUploader {
            reject_status: Some(400),
            ..FakeUploader::default()
        });
        let mut rec = recorder(FakeEncoder::new(vec![b"abc"]), &uploader);

        rec.start_recording(&stream(), "s3", None).await.unwrap();
        let result = rec.stop_recording().await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("failed to upload"));
    }

    #[tokio::test]
    async fn stop_without_start_resolves_with_error() {
        let uploader = Arc::new(FakeUploader::default());
        let mut rec = recorder(FakeEncoder::new(vec![]), &uploader);

        let result = rec.stop_recording().await;
        assert!(!result.success);
        assert!(uploader.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn encoder_start_failure_is_reported() {
        let uploader = Arc::new(FakeUploader::default());
        let mut encoder = FakeEncoder::new(vec![]);
        encoder.fail_start = true;
        let mut rec = recorder(encoder, &uploader);

        let err = rec.start_recording(&stream(), "s4", None).await.unwrap_err();
        assert!(matches!(err, Error::Recording(_)));
        assert!(!rec.is_recording());
    }

    #[tokio::test]
    async fn stopped_stream_is_rejected() {
        let uploader = Arc::new(FakeUploader::default());
        let mut rec = recorder(FakeEncoder::new(vec![]), &uploader);
        let s = stream();
        s.stop_all();

        assert!(rec.start_recording(&s, "s5", None).await.is_err());
    }

    #[tokio::test]
    async fn stop_is_terminal_and_repeatable() {
        let uploader = Arc::new(FakeUploader::default());
        let mut rec = recorder(FakeEncoder::new(vec![b"x"]), &uploader);

        rec.start_recording(&stream(), "s6", None).await.unwrap();
        let first = rec.stop_recording().await;
        let second = rec.stop_recording().await;
        assert_eq!(first, second);
        assert_eq!(uploader.received.lock().unwrap().len(), 2);

        let err = rec.start_recording(&stream(), "s6", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_encoder_is_abandoned_after_drain_timeout() {
        let uploader = Arc::new(FakeUploader::default());
        let mut encoder = FakeEncoder::new(vec![b"abc"]);
        encoder.stuck_open = true;
        let mut rec = Recorder::new(
            Arc::new(encoder),
            Arc::clone(&uploader) as Arc<dyn ChunkUploader>,
            RecorderConfig {
                drain_timeout: Duration::from_secs(5),
                ..RecorderConfig::default()
            },
        );

        rec.start_recording(&stream(), "s8", None).await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(60), rec.stop_recording())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("did not finish within 5s"));
        assert!(!rec.is_recording());
        // no final marker after an abandoned drain
        assert!(uploader.received.lock().unwrap().iter().all(|(_, last, _)| !last));
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let uploader = Arc::new(FakeUploader::default());
        let mut rec = recorder(FakeEncoder::new(vec![b"x"]), &uploader);

        rec.start_recording(&stream(), "s7", None).await.unwrap();
        assert!(rec.cleanup());
        assert!(!rec.cleanup());

        let result = rec.stop_recording().await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("recording aborted"));
    }

    #[test]
    fn result_serializes_camel_case() {
        let json = serde_json::to_value(RecordingResult::ok(Some("/p.m3u8".to_string()))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["playlistUrl"], "/p.m3u8");
        assert!(json.get("error").is_none());
    }
}

//! Local media acquisition
//!
//! Capture devices are an external capability behind [`MediaDevices`]. The
//! interview needs a microphone; the camera is optional and its absence is
//! reported as a warning, not a failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::notice::Notifier;
use crate::{Error, Result};

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A single audio or video track
///
/// Clones share the same underlying track; stopping any clone stops all.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    stopped: Arc<AtomicBool>,
}

impl MediaTrack {
    /// Create a live track with a fresh id
    #[must_use]
    pub fn new(kind: TrackKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Whether the track is still producing media
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Stop the track. Returns `true` only for the call that actually stopped it.
    pub fn stop(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }
}

/// A set of tracks from one capture or one remote peer
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    /// Create a stream from tracks
    #[must_use]
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tracks,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Whether the stream carries a live audio track
    #[must_use]
    pub fn has_audio(&self) -> bool {
        self.has_live(TrackKind::Audio)
    }

    /// Whether the stream carries a live video track
    #[must_use]
    pub fn has_video(&self) -> bool {
        self.has_live(TrackKind::Video)
    }

    /// Whether any track is still live
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    /// Stop every track; returns how many were live
    pub fn stop_all(&self) -> usize {
        self.tracks.iter().filter(|t| t.stop()).count()
    }

    fn has_live(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind == kind && t.is_live())
    }
}

/// What to capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

/// Access to local capture devices
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request a stream matching `constraints`
    ///
    /// Implementations return [`Error::Permission`] when the user or the
    /// platform denies access.
    async fn get_user_media(&self, constraints: MediaConstraints) -> Result<MediaStream>;
}

/// Outcome of media acquisition
#[derive(Debug, Clone)]
pub struct AcquiredMedia {
    pub stream: MediaStream,
    /// Camera was wanted but unavailable
    pub audio_only: bool,
}

/// Acquire microphone (and camera when `want_video`)
///
/// If the camera request fails the microphone is requested alone and a
/// warning notice is emitted.
///
/// # Errors
///
/// Returns [`Error::Permission`] if no microphone stream can be acquired
pub async fn acquire(
    devices: &dyn MediaDevices,
    want_video: bool,
    notifier: &Notifier,
) -> Result<AcquiredMedia> {
    if want_video {
        match devices
            .get_user_media(MediaConstraints {
                audio: true,
                video: true,
            })
            .await
        {
            Ok(stream) if stream.has_audio() => {
                let audio_only = !stream.has_video();
                if audio_only {
                    tracing::warn!(stream_id = %stream.id(), "camera granted but no video track");
                    warn_audio_only(notifier);
                } else {
                    tracing::debug!(stream_id = %stream.id(), "acquired camera and microphone");
                }
                return Ok(AcquiredMedia { stream, audio_only });
            }
            Ok(stream) => {
                stream.stop_all();
                tracing::warn!("camera stream had no audio track, retrying audio only");
            }
            Err(e) => {
                tracing::warn!(error = %e, "camera unavailable, falling back to audio only");
            }
        }

        warn_audio_only(notifier);
    }

    let stream = devices
        .get_user_media(MediaConstraints {
            audio: true,
            video: false,
        })
        .await
        .map_err(|e| match e {
            Error::Permission(_) => e,
            other => Error::Permission(format!("microphone unavailable: {other}")),
        })?;

    if !stream.has_audio() {
        stream.stop_all();
        return Err(Error::Permission("no microphone track available".to_string()));
    }

    Ok(AcquiredMedia {
        stream,
        audio_only: want_video,
    })
}

fn warn_audio_only(notifier: &Notifier) {
    notifier.warn(
        "Camera unavailable",
        "Continuing with audio only. Your interview will not include video.",
    );
}

#[cfg(test)]
mod tests {
    use crate::notice::NoticeLevel;

    use super::*;

    struct Devices {
        camera: bool,
        microphone: bool,
    }

    /// Grants the camera request but hands back audio only
    struct VideolessCamera;

    #[async_trait]
    impl MediaDevices for VideolessCamera {
        async fn get_user_media(&self, _constraints: MediaConstraints) -> Result<MediaStream> {
            Ok(MediaStream::new(vec![MediaTrack::new(TrackKind::Audio)]))
        }
    }

    #[async_trait]
    impl MediaDevices for Devices {
        async fn get_user_media(&self, constraints: MediaConstraints) -> Result<MediaStream> {
            if constraints.video && !self.camera {
                return Err(Error::Permission("camera denied".to_string()));
            }
            if constraints.audio && !self.microphone {
                return Err(Error::Permission("microphone denied".to_string()));
            }

            let mut tracks = vec![MediaTrack::new(TrackKind::Audio)];
            if constraints.video {
                tracks.push(MediaTrack::new(TrackKind::Video));
            }
            Ok(MediaStream::new(tracks))
        }
    }

    #[test]
    fn track_stop_is_idempotent() {
        let track = MediaTrack::new(TrackKind::Audio);
        let clone = track.clone();

        assert!(track.stop());
        assert!(!clone.stop());
        assert!(!track.is_live());
        assert!(!clone.is_live());
    }

    #[test]
    fn stop_all_counts_live_tracks_once() {
        let stream = MediaStream::new(vec![
            MediaTrack::new(TrackKind::Audio),
            MediaTrack::new(TrackKind::Video),
        ]);
        assert_eq!(stream.stop_all(), 2);
        assert_eq!(stream.stop_all(), 0);
        assert!(!stream.is_active());
    }

    #[tokio::test]
    async fn acquires_audio_and_video() {
        let (notifier, mut rx) = Notifier::channel();
        let devices = Devices {
            camera: true,
            microphone: true,
        };

        let media = acquire(&devices, true, &notifier).await.unwrap();
        assert!(!media.audio_only);
        assert!(media.stream.has_video());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn camera_denied_falls_back_to_audio_with_warning() {
        let (notifier, mut rx) = Notifier::channel();
        let devices = Devices {
            camera: false,
            microphone: true,
        };

        let media = acquire(&devices, true, &notifier).await.unwrap();
        assert!(media.audio_only);
        assert!(media.stream.has_audio());
        assert!(!media.stream.has_video());

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn granted_camera_without_video_track_warns() {
        let (notifier, mut rx) = Notifier::channel();

        let media = acquire(&VideolessCamera, true, &notifier).await.unwrap();
        assert!(media.audio_only);
        assert!(media.stream.is_active());

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.title, "Camera unavailable");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn microphone_denied_is_a_permission_error() {
        let devices = Devices {
            camera: true,
            microphone: false,
        };

        let err = acquire(&devices, true, &Notifier::disabled()).await.unwrap_err();
        assert!(matches!(err, Error::Permission(_)));
    }

    #[tokio::test]
    async fn audio_only_request_skips_camera() {
        let (notifier, mut rx) = Notifier::channel();
        let devices = Devices {
            camera: false,
            microphone: true,
        };

        let media = acquire(&devices, false, &notifier).await.unwrap();
        assert!(!media.audio_only);
        assert!(rx.try_recv().is_err());
    }
}

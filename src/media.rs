use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use webrtc::api::media_engine::MIME_TYPE_VP8;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// One track inside a [`MediaStream`].
#[derive(Clone)]
pub enum MediaTrack {
    /// Captured locally and sent through the outbound slot.
    Local(Arc<TrackLocalStaticSample>),
    /// Received from the remote peer.
    Remote(Arc<TrackRemote>),
}

impl MediaTrack {
    pub fn id(&self) -> String {
        match self {
            MediaTrack::Local(track) => track.id().to_string(),
            MediaTrack::Remote(track) => track.id().to_string(),
        }
    }
}

impl std::fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaTrack::Local(_) => write!(f, "Local({})", self.id()),
            MediaTrack::Remote(_) => write!(f, "Remote({})", self.id()),
        }
    }
}

/// A stream as handed to video sinks: an id plus its tracks.
#[derive(Debug, Clone)]
pub struct MediaStream {
    pub id: String,
    pub tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<MediaTrack>) -> Self {
        MediaStream {
            id: id.into(),
            tracks,
        }
    }

    /// Local tracks, ready for `add_track` on a peer connection.
    pub fn local_tracks(&self) -> impl Iterator<Item = Arc<dyn TrackLocal + Send + Sync>> + '_ {
        self.tracks.iter().filter_map(|t| match t {
            MediaTrack::Local(track) => {
                Some(Arc::clone(track) as Arc<dyn TrackLocal + Send + Sync>)
            }
            MediaTrack::Remote(_) => None,
        })
    }
}

/// Source of the publisher's camera video.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Video only, never audio. Errors are permission or device failures.
    async fn acquire_video(&self) -> anyhow::Result<MediaStream>;

    /// Stops capturing into `stream`. Releasing an unknown stream is a no-op.
    async fn release(&self, stream: &MediaStream) -> anyhow::Result<()>;
}

/// Capture backed by a VP8 sample track the embedding application feeds.
///
/// Each `acquire_video` call creates a fresh track; frames pushed with
/// [`SampleTrackCapture::write_frame`] go to the most recent one.
pub struct SampleTrackCapture {
    stream_id: String,
    frame_duration: Duration,
    current: tokio::sync::Mutex<Option<Arc<TrackLocalStaticSample>>>,
}

impl SampleTrackCapture {
    pub fn new(stream_id: impl Into<String>, fps: u32) -> Self {
        SampleTrackCapture {
            stream_id: stream_id.into(),
            frame_duration: Duration::from_secs(1) / fps.max(1),
            current: tokio::sync::Mutex::new(None),
        }
    }

    /// Whether a track is currently being fed by [`SampleTrackCapture::write_frame`].
    pub async fn is_capturing(&self) -> bool {
        self.current.lock().await.is_some()
    }

    /// Writes one encoded VP8 frame. A no-op before acquisition and after release.
    pub async fn write_frame(&self, frame: Bytes) -> anyhow::Result<()> {
        let track = self.current.lock().await.clone();
        if let Some(track) = track {
            track
                .write_sample(&Sample {
                    data: frame,
                    duration: self.frame_duration,
                    ..Default::default()
                })
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaCapture for SampleTrackCapture {
    async fn acquire_video(&self) -> anyhow::Result<MediaStream> {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            self.stream_id.clone(),
        ));
        *self.current.lock().await = Some(track.clone());
        Ok(MediaStream::new(
            self.stream_id.clone(),
            vec![MediaTrack::Local(track)],
        ))
    }

    async fn release(&self, stream: &MediaStream) -> anyhow::Result<()> {
        let mut current = self.current.lock().await;
        let owned = current.as_ref().map_or(false, |track| {
            stream.tracks.iter().any(|t| match t {
                MediaTrack::Local(local) => Arc::ptr_eq(local, track),
                MediaTrack::Remote(_) => false,
            })
        });
        if owned {
            *current = None;
        }
        Ok(())
    }
}

use crate::media::{MediaStream, MediaTrack};
use crate::types::Playback;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Where a session's video ends up. Binding a new stream replaces the old one.
pub trait VideoSink: Send + Sync {
    fn display(&self, stream: MediaStream, playback: Playback);
}

/// User-visible log of a session.
pub trait LogSink: Send + Sync {
    fn append(&self, line: &str);

    /// Failures the user must see before retrying.
    fn alert(&self, message: &str) {
        self.append(message);
    }
}

/// Video sink for headless runs: logs bindings and drains inbound RTP so
/// the receiver keeps flowing, reporting packet counts.
#[derive(Default)]
pub struct ConsoleVideoSink {
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleVideoSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VideoSink for ConsoleVideoSink {
    fn display(&self, stream: MediaStream, playback: Playback) {
        info!(
            stream_id = %stream.id,
            tracks = stream.tracks.len(),
            autoplay = playback.autoplay,
            controls = playback.controls,
            "[Client] Video sink bound"
        );

        let remote = stream.tracks.iter().find_map(|t| match t {
            MediaTrack::Remote(track) => Some(track.clone()),
            MediaTrack::Local(_) => None,
        });

        let mut reader = self.reader.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = reader.take() {
            previous.abort();
        }
        if let Some(track) = remote {
            let stream_id = stream.id.clone();
            *reader = Some(tokio::spawn(async move {
                let mut packets: u64 = 0;
                while let Ok((_packet, _)) = track.read_rtp().await {
                    packets += 1;
                    if packets % 500 == 0 {
                        debug!(stream_id = %stream_id, packets, "[Client] Inbound RTP");
                    }
                }
                info!(stream_id = %stream_id, packets, "[Client] Inbound track ended");
            }));
        }
    }
}

impl Drop for ConsoleVideoSink {
    fn drop(&mut self) {
        if let Ok(mut reader) = self.reader.lock() {
            if let Some(handle) = reader.take() {
                handle.abort();
            }
        }
    }
}

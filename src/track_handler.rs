use std::sync::Arc;
use tracing::info;

use crate::id_types::SessionId;
use crate::sink::VideoSink;
use crate::transport::PeerTransport;
use crate::types::Playback;

/// Binds every inbound track event's stream to `video_sink`.
///
/// Each event replaces the sink's source: with several tracks, the last
/// event wins.
pub fn attach_track_handler(
    transport: &Arc<dyn PeerTransport>,
    session_id: SessionId,
    video_sink: Arc<dyn VideoSink>,
) {
    transport.on_track(Box::new(move |stream| {
        info!(
            session_id = %session_id,
            stream_id = %stream.id,
            tracks = stream.tracks.len(),
            "[Client] on_track triggered!"
        );
        video_sink.display(stream, Playback::remote());
    }));
}

use crate::media::{MediaStream, MediaTrack};
use crate::media_setup::MediaSetup;
use crate::types::{ConnectivityHandler, ConnectivityState, TrackHandler};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_gathering_state::RTCIceGatheringState;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// The peer-connection capability a session drives.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Puts every local track of `stream` into the outbound slot.
    async fn add_local_stream(&self, stream: &MediaStream) -> anyhow::Result<()>;

    /// Declares a receive-only video transceiver.
    async fn add_recvonly_video(&self) -> anyhow::Result<()>;

    async fn create_offer(&self) -> anyhow::Result<RTCSessionDescription>;

    /// Applies the local description; candidate gathering starts here.
    async fn set_local_description(&self, desc: RTCSessionDescription) -> anyhow::Result<()>;

    /// Resolves once no more candidates will be gathered.
    async fn gathering_complete(&self);

    /// Current local description, with every gathered candidate embedded.
    async fn local_description(&self) -> Option<RTCSessionDescription>;

    async fn set_remote_description(&self, desc: RTCSessionDescription) -> anyhow::Result<()>;

    fn on_connectivity_change(&self, handler: ConnectivityHandler);

    fn on_track(&self, handler: TrackHandler);

    async fn close(&self) -> anyhow::Result<()>;
}

/// `PeerTransport` backed by a webrtc-rs `RTCPeerConnection`.
pub struct RtcTransport {
    pc: Arc<RTCPeerConnection>,
    gather_complete: Mutex<Option<mpsc::Receiver<()>>>,
}

impl RtcTransport {
    /// Creates the peer connection with the given STUN/TURN servers.
    pub async fn new(ice_servers: &[String]) -> anyhow::Result<Self> {
        Self::with_configuration(MediaSetup::get_rtc_config(ice_servers)).await
    }

    pub async fn with_configuration(config: RTCConfiguration) -> anyhow::Result<Self> {
        let api = MediaSetup::create_webrtc_api()?;
        let pc = api
            .new_peer_connection(config)
            .await
            .context("Failed to create peer connection")?;
        Ok(Self::from_peer_connection(Arc::new(pc)))
    }

    pub fn from_peer_connection(pc: Arc<RTCPeerConnection>) -> Self {
        RtcTransport {
            pc,
            gather_complete: Mutex::new(None),
        }
    }

    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.pc
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn add_local_stream(&self, stream: &MediaStream) -> anyhow::Result<()> {
        for track in stream.local_tracks() {
            let rtp_sender = self.pc.add_track(track).await?;
            // Drain RTCP so interceptors keep working.
            tokio::spawn(async move {
                let mut rtcp_buf = vec![0u8; 1500];
                while rtp_sender.read(&mut rtcp_buf).await.is_ok() {}
            });
        }
        Ok(())
    }

    async fn add_recvonly_video(&self) -> anyhow::Result<()> {
        MediaSetup::add_recvonly_video(&self.pc).await
    }

    async fn create_offer(&self) -> anyhow::Result<RTCSessionDescription> {
        Ok(self.pc.create_offer(None).await?)
    }

    async fn set_local_description(&self, desc: RTCSessionDescription) -> anyhow::Result<()> {
        // The promise must exist before gathering can start.
        let rx = self.pc.gathering_complete_promise().await;
        *self.gather_complete.lock().await = Some(rx);
        self.pc.set_local_description(desc).await?;
        Ok(())
    }

    async fn gathering_complete(&self) {
        let rx = self.gather_complete.lock().await.take();
        if self.pc.ice_gathering_state() == RTCIceGatheringState::Complete {
            return;
        }
        if let Some(mut rx) = rx {
            debug!("[Client] Waiting for ICE gathering");
            let _ = rx.recv().await;
        }
    }

    async fn local_description(&self) -> Option<RTCSessionDescription> {
        self.pc.local_description().await
    }

    async fn set_remote_description(&self, desc: RTCSessionDescription) -> anyhow::Result<()> {
        self.pc.set_remote_description(desc).await?;
        Ok(())
    }

    fn on_connectivity_change(&self, handler: ConnectivityHandler) {
        self.pc
            .on_ice_connection_state_change(Box::new(move |s: RTCIceConnectionState| {
                handler(ConnectivityState::from(s));
                Box::pin(async {})
            }));
    }

    fn on_track(&self, handler: TrackHandler) {
        self.pc.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let stream_id = track.stream_id().to_string();
                handler(MediaStream::new(stream_id, vec![MediaTrack::Remote(track)]));
                Box::pin(async {})
            },
        ));
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}

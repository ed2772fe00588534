use super::*;
use crate::id_types::{PublisherKey, SessionId};
use crate::media::{MediaCapture, MediaStream, MediaTrack, SampleTrackCapture};
use crate::signaling::{SignalingChannel, SignalingRequest, SignalingResponse};
use crate::sink::{LogSink, VideoSink};
use crate::transport::PeerTransport;
use crate::types::{ConnectivityHandler, OnConnected, Playback, TrackHandler};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

const GATHERED_CANDIDATE: &str = "a=candidate:1 1 udp 2130706431 192.0.2.1 50000 typ host\r\n";

fn description(kind: &str, sdp: &str) -> RTCSessionDescription {
    serde_json::from_value(serde_json::json!({ "type": kind, "sdp": sdp })).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    AddLocalStream(String),
    AddRecvonly,
    CreateOffer,
    SetLocal,
    Gathered,
    SetRemote(String),
    Close,
}

#[derive(Default)]
struct FakeTransport {
    calls: Mutex<Vec<Call>>,
    fail_attach: bool,
    fail_recvonly: bool,
    fail_offer: bool,
    fail_local: bool,
    fail_remote: bool,
    hang_gathering: bool,
    gathered: AtomicBool,
    local: Mutex<Option<RTCSessionDescription>>,
    connectivity: Mutex<Option<ConnectivityHandler>>,
    track: Mutex<Option<TrackHandler>>,
}

impl FakeTransport {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn emit_state(&self, state: ConnectivityState) {
        if let Some(handler) = self.connectivity.lock().unwrap().as_ref() {
            handler(state);
        }
    }

    fn emit_track(&self, stream: MediaStream) {
        if let Some(handler) = self.track.lock().unwrap().as_ref() {
            handler(stream);
        }
    }

    fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }
}

#[async_trait]
impl PeerTransport for FakeTransport {
    async fn add_local_stream(&self, stream: &MediaStream) -> anyhow::Result<()> {
        if self.fail_attach {
            anyhow::bail!("no outbound slot for video");
        }
        self.record(Call::AddLocalStream(stream.id.clone()));
        Ok(())
    }

    async fn add_recvonly_video(&self) -> anyhow::Result<()> {
        if self.fail_recvonly {
            anyhow::bail!("video codec not registered");
        }
        self.record(Call::AddRecvonly);
        Ok(())
    }

    async fn create_offer(&self) -> anyhow::Result<RTCSessionDescription> {
        self.record(Call::CreateOffer);
        if self.fail_offer {
            anyhow::bail!("offer rejected by transport");
        }
        Ok(description("offer", "v=0\r\nm=video 9 UDP/TLS/RTP/SAVPF 96\r\n"))
    }

    async fn set_local_description(&self, desc: RTCSessionDescription) -> anyhow::Result<()> {
        if self.fail_local {
            anyhow::bail!("offer is stale");
        }
        self.record(Call::SetLocal);
        *self.local.lock().unwrap() = Some(desc);
        Ok(())
    }

    async fn gathering_complete(&self) {
        if self.hang_gathering {
            std::future::pending::<()>().await;
        }
        self.gathered.store(true, Ordering::SeqCst);
        self.record(Call::Gathered);
    }

    async fn local_description(&self) -> Option<RTCSessionDescription> {
        let local = self.local.lock().unwrap().clone()?;
        if self.gathered.load(Ordering::SeqCst) {
            Some(description("offer", &format!("{}{}", local.sdp, GATHERED_CANDIDATE)))
        } else {
            Some(local)
        }
    }

    async fn set_remote_description(&self, desc: RTCSessionDescription) -> anyhow::Result<()> {
        if self.fail_remote {
            anyhow::bail!("answer does not match offer");
        }
        self.record(Call::SetRemote(desc.sdp.clone()));
        self.emit_state(ConnectivityState::Checking);
        self.emit_state(ConnectivityState::Connected);
        Ok(())
    }

    fn on_connectivity_change(&self, handler: ConnectivityHandler) {
        *self.connectivity.lock().unwrap() = Some(handler);
    }

    fn on_track(&self, handler: TrackHandler) {
        *self.track.lock().unwrap() = Some(handler);
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.record(Call::Close);
        self.emit_state(ConnectivityState::Closed);
        Ok(())
    }
}

enum Reply {
    Respond(SignalingResponse),
    Unreachable,
    Hang,
}

struct FakeSignaling {
    reply: Reply,
    requests: Mutex<Vec<serde_json::Value>>,
}

impl FakeSignaling {
    fn new(reply: Reply) -> Self {
        FakeSignaling {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn answering() -> Self {
        Self::new(Reply::Respond(SignalingResponse::answer(&description(
            "answer",
            "v=0\r\nanswer-sdp\r\n",
        ))))
    }

    fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignalingChannel for FakeSignaling {
    async fn exchange(
        &self,
        request: &SignalingRequest,
    ) -> Result<SignalingResponse, SessionError> {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());
        match &self.reply {
            Reply::Respond(response) => Ok(response.clone()),
            Reply::Unreachable => Err(SessionError::SignalingTransport(
                "connection refused".to_string(),
            )),
            Reply::Hang => std::future::pending().await,
        }
    }
}

struct FakeCapture {
    deny: bool,
    calls: AtomicU32,
    released: Mutex<Vec<String>>,
    inner: SampleTrackCapture,
}

impl FakeCapture {
    fn granting() -> Self {
        FakeCapture {
            deny: false,
            calls: AtomicU32::new(0),
            released: Mutex::new(Vec::new()),
            inner: SampleTrackCapture::new("camera", 30),
        }
    }

    fn denying() -> Self {
        FakeCapture {
            deny: true,
            ..Self::granting()
        }
    }
}

#[async_trait]
impl MediaCapture for FakeCapture {
    async fn acquire_video(&self) -> anyhow::Result<MediaStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.deny {
            anyhow::bail!("NotAllowedError: permission denied");
        }
        self.inner.acquire_video().await
    }

    async fn release(&self, stream: &MediaStream) -> anyhow::Result<()> {
        self.released.lock().unwrap().push(stream.id.clone());
        self.inner.release(stream).await
    }
}

impl FakeCapture {
    fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct RecordingLogSink {
    lines: Mutex<Vec<String>>,
    alerts: Mutex<Vec<String>>,
}

impl RecordingLogSink {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl LogSink for RecordingLogSink {
    fn append(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
struct RecordingVideoSink {
    bound: Mutex<Vec<(String, Playback)>>,
}

impl RecordingVideoSink {
    fn current(&self) -> Option<(String, Playback)> {
        self.bound.lock().unwrap().last().cloned()
    }
}

impl VideoSink for RecordingVideoSink {
    fn display(&self, stream: MediaStream, playback: Playback) {
        self.bound.lock().unwrap().push((stream.id, playback));
    }
}

struct Harness {
    manager: Arc<SessionManager>,
    transport: Arc<FakeTransport>,
    signaling: Arc<FakeSignaling>,
    capture: Arc<FakeCapture>,
    log: Arc<RecordingLogSink>,
    video: Arc<RecordingVideoSink>,
    connected: Arc<AtomicU32>,
    registry: SessionRegistry,
}

fn harness_with(
    transport: FakeTransport,
    signaling: FakeSignaling,
    capture: FakeCapture,
    options: NegotiationOptions,
) -> Harness {
    let transport = Arc::new(transport);
    let signaling = Arc::new(signaling);
    let capture = Arc::new(capture);
    let log = Arc::new(RecordingLogSink::default());
    let video = Arc::new(RecordingVideoSink::default());
    let connected = Arc::new(AtomicU32::new(0));
    let registry = SessionRegistry::new();

    let counter = connected.clone();
    let on_connected: OnConnected = Arc::new(move |_id: &SessionId| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let manager = SessionManager::builder(transport.clone())
        .signaling(signaling.clone())
        .media(capture.clone())
        .video_sink(video.clone())
        .log_sink(log.clone())
        .on_connected(on_connected)
        .options(options)
        .registry(registry.clone())
        .build()
        .unwrap();

    Harness {
        manager: Arc::new(manager),
        transport,
        signaling,
        capture,
        log,
        video,
        connected,
        registry,
    }
}

fn harness(transport: FakeTransport, signaling: FakeSignaling) -> Harness {
    harness_with(
        transport,
        signaling,
        FakeCapture::granting(),
        NegotiationOptions::default(),
    )
}

#[tokio::test]
async fn test_viewer_success_applies_answer_once() {
    let h = harness(FakeTransport::default(), FakeSignaling::answering());

    h.manager.watch("pub-1").await.unwrap();

    assert_eq!(
        h.transport.calls(),
        vec![
            Call::AddRecvonly,
            Call::CreateOffer,
            Call::SetLocal,
            Call::Gathered,
            Call::SetRemote("v=0\r\nanswer-sdp\r\n".to_string()),
        ]
    );
    assert_eq!(h.connected.load(Ordering::SeqCst), 1);

    let lines = h.log.lines();
    let last = lines.last().expect("state transitions should be logged");
    assert!(last == "connected" || last == "completed");
    assert_eq!(h.manager.connectivity(), ConnectivityState::Connected);
    assert!(h.log.alerts().is_empty());
}

#[tokio::test]
async fn test_viewer_request_carries_full_gathered_description() {
    let h = harness(FakeTransport::default(), FakeSignaling::answering());

    h.manager.watch("pub-1").await.unwrap();

    let requests = h.signaling.requests();
    assert_eq!(requests.len(), 1);
    let body = requests[0].as_object().unwrap();
    assert_eq!(body.len(), 3);
    assert_eq!(body["mode"], "viewer");
    assert_eq!(body["publisherKey"], "pub-1");
    assert_eq!(body["sdp"]["type"], "offer");
    assert!(body["sdp"]["sdp"]
        .as_str()
        .unwrap()
        .ends_with(GATHERED_CANDIDATE));
}

#[tokio::test]
async fn test_viewer_rejection_alerts_and_never_applies_answer() {
    let h = harness(
        FakeTransport::default(),
        FakeSignaling::new(Reply::Respond(SignalingResponse::rejected(
            "publisher not found",
        ))),
    );

    let err = h.manager.watch("pub-1").await.unwrap_err();

    assert!(matches!(err, SessionError::SignalingRejection(_)));
    assert!(h
        .log
        .alerts()
        .iter()
        .any(|a| a.contains("Error connecting: publisher not found")));
    assert!(!h
        .transport
        .calls()
        .iter()
        .any(|c| matches!(c, Call::SetRemote(_))));
    assert_eq!(h.connected.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_broadcast_with_denied_camera_never_offers() {
    let h = harness_with(
        FakeTransport::default(),
        FakeSignaling::answering(),
        FakeCapture::denying(),
        NegotiationOptions::default(),
    );

    let err = h.manager.broadcast("").await.unwrap_err();

    assert!(matches!(err, SessionError::MediaAcquisition(_)));
    assert_eq!(h.capture.calls.load(Ordering::SeqCst), 1);
    assert!(h.transport.calls().is_empty());
    assert!(h.signaling.requests().is_empty());
    assert!(h.log.lines().iter().any(|l| l.contains("permission denied")));
    assert!(h.log.alerts().is_empty());
    assert_eq!(h.manager.session().role(), None);
}

#[tokio::test]
async fn test_second_track_event_replaces_first() {
    let h = harness(FakeTransport::default(), FakeSignaling::answering());
    h.manager.watch("pub-1").await.unwrap();

    let capture = SampleTrackCapture::new("unused", 30);
    let first = capture.acquire_video().await.unwrap();
    let second = capture.acquire_video().await.unwrap();
    h.transport
        .emit_track(MediaStream::new("stream-a", first.tracks.clone()));
    h.transport
        .emit_track(MediaStream::new("stream-b", second.tracks.clone()));

    let (stream_id, playback) = h.video.current().unwrap();
    assert_eq!(stream_id, "stream-b");
    assert_eq!(playback, Playback::remote());
    assert!(playback.autoplay && playback.controls);
}

#[tokio::test]
async fn test_publisher_attaches_stream_before_offer() {
    let h = harness(FakeTransport::default(), FakeSignaling::answering());

    h.manager.broadcast("").await.unwrap();

    let calls = h.transport.calls();
    assert_eq!(calls[0], Call::AddLocalStream("camera".to_string()));
    assert_eq!(calls[1], Call::CreateOffer);

    let (stream_id, playback) = h.video.current().unwrap();
    assert_eq!(stream_id, "camera");
    assert_eq!(playback, Playback::preview());

    let body = &h.signaling.requests()[0];
    assert_eq!(body["mode"], "publisher");
    assert_eq!(body["publisherKey"], "");
    assert_eq!(h.connected.load(Ordering::SeqCst), 1);
    assert!(h.manager.session().has_local_stream());
    assert_eq!(h.manager.session().role(), Some(Role::Publisher));
}

#[tokio::test]
async fn test_offer_failure_is_logged_without_post() {
    let transport = FakeTransport {
        fail_offer: true,
        ..Default::default()
    };
    let h = harness(transport, FakeSignaling::answering());

    let err = h.manager.watch("pub-1").await.unwrap_err();

    assert!(matches!(err, SessionError::OfferCreation(_)));
    assert!(h.signaling.requests().is_empty());
    assert!(h
        .log
        .lines()
        .iter()
        .any(|l| l.contains("Failed to create offer")));
    assert_eq!(h.transport.count(&Call::SetLocal), 0);
}

#[tokio::test]
async fn test_network_failure_is_console_only() {
    let h = harness(
        FakeTransport::default(),
        FakeSignaling::new(Reply::Unreachable),
    );

    let err = h.manager.watch("pub-1").await.unwrap_err();

    assert!(matches!(err, SessionError::SignalingTransport(_)));
    assert!(h.log.alerts().is_empty());
    assert!(h.log.lines().is_empty());
    assert_eq!(h.connected.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_remote_description_failure_alerts() {
    let transport = FakeTransport {
        fail_remote: true,
        ..Default::default()
    };
    let h = harness(transport, FakeSignaling::answering());

    let err = h.manager.watch("pub-1").await.unwrap_err();

    assert!(matches!(err, SessionError::RemoteDescription(_)));
    let alerts = h.log.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("answer does not match offer"));
    assert_eq!(h.connected.load(Ordering::SeqCst), 0);
    assert_eq!(h.manager.connectivity(), ConnectivityState::New);
}

#[tokio::test]
async fn test_success_without_sdp_alerts_empty_description() {
    let h = harness(
        FakeTransport::default(),
        FakeSignaling::new(Reply::Respond(SignalingResponse {
            success: true,
            sdp: None,
            error: None,
        })),
    );

    let err = h.manager.watch("pub-1").await.unwrap_err();

    assert!(matches!(err, SessionError::EmptyDescription));
    assert_eq!(
        h.log.alerts(),
        vec!["Session Description must not be empty".to_string()]
    );
}

#[tokio::test]
async fn test_signaling_deadline() {
    let options = NegotiationOptions {
        gather_timeout: Duration::from_secs(5),
        signaling_timeout: Duration::from_millis(50),
    };
    let h = harness_with(
        FakeTransport::default(),
        FakeSignaling::new(Reply::Hang),
        FakeCapture::granting(),
        options,
    );

    let err = h.manager.watch("pub-1").await.unwrap_err();

    assert!(matches!(err, SessionError::SignalingTimeout(d) if d == Duration::from_millis(50)));
    assert_eq!(h.signaling.requests().len(), 1);
}

#[tokio::test]
async fn test_gathering_deadline_sends_nothing() {
    let options = NegotiationOptions {
        gather_timeout: Duration::from_millis(50),
        signaling_timeout: Duration::from_secs(5),
    };
    let transport = FakeTransport {
        hang_gathering: true,
        ..Default::default()
    };
    let h = harness_with(
        transport,
        FakeSignaling::answering(),
        FakeCapture::granting(),
        options,
    );

    let err = h.manager.watch("pub-1").await.unwrap_err();

    assert!(matches!(err, SessionError::GatheringTimeout(_)));
    assert!(h.signaling.requests().is_empty());
    assert!(h.log.lines().iter().any(|l| l.contains("ICE gathering")));
}

#[tokio::test]
async fn test_close_cancels_inflight_negotiation() {
    let h = harness(FakeTransport::default(), FakeSignaling::new(Reply::Hang));

    let manager = h.manager.clone();
    let pending = tokio::spawn(async move { manager.watch("pub-1").await });

    for _ in 0..100 {
        if !h.signaling.requests().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.signaling.requests().len(), 1);

    h.manager.close().await.unwrap();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(SessionError::Cancelled)));
    assert_eq!(h.transport.count(&Call::Close), 1);
    assert!(h.manager.session().is_closed());
    assert_eq!(h.manager.connectivity(), ConnectivityState::Closed);
    assert_eq!(h.log.lines().last().map(String::as_str), Some("closed"));
    assert!(h.registry.is_empty());
    assert!(h.log.alerts().is_empty());
    assert!(!h.log.lines().iter().any(|l| l.contains("cancelled")));

    let lines_before = h.log.lines().len();
    let again = h.manager.watch("pub-1").await;
    assert!(matches!(again, Err(SessionError::Closed)));
    assert_eq!(h.transport.count(&Call::CreateOffer), 1);
    assert_eq!(h.log.lines().len(), lines_before);
    assert!(h.log.alerts().is_empty());
}

#[tokio::test]
async fn test_close_releases_local_stream_and_is_idempotent() {
    let h = harness(FakeTransport::default(), FakeSignaling::answering());
    h.manager.broadcast("").await.unwrap();
    assert!(h.manager.session().has_local_stream());

    h.manager.close().await.unwrap();
    h.manager.close().await.unwrap();

    assert!(!h.manager.session().has_local_stream());
    assert_eq!(h.transport.count(&Call::Close), 1);
    assert_eq!(h.capture.released(), vec!["camera".to_string()]);
    assert!(!h.capture.inner.is_capturing().await);
}

#[tokio::test]
async fn test_local_description_failure_is_logged_without_post() {
    let transport = FakeTransport {
        fail_local: true,
        ..Default::default()
    };
    let h = harness(transport, FakeSignaling::answering());

    let err = h.manager.watch("pub-1").await.unwrap_err();

    assert!(matches!(err, SessionError::LocalDescription(_)));
    assert!(h
        .log
        .lines()
        .iter()
        .any(|l| l.contains("Failed to set local description: offer is stale")));
    assert!(h.log.alerts().is_empty());
    assert!(h.signaling.requests().is_empty());
    assert_eq!(h.transport.count(&Call::Gathered), 0);
}

#[tokio::test]
async fn test_transceiver_failure_stops_before_offer() {
    let transport = FakeTransport {
        fail_recvonly: true,
        ..Default::default()
    };
    let h = harness(transport, FakeSignaling::answering());

    let err = h.manager.watch("pub-1").await.unwrap_err();

    assert!(matches!(err, SessionError::Transceiver(_)));
    assert!(h
        .log
        .lines()
        .iter()
        .any(|l| l.contains("Failed to add video transceiver")));
    assert!(h.log.alerts().is_empty());
    assert!(h.signaling.requests().is_empty());
    assert_eq!(h.transport.count(&Call::CreateOffer), 0);
    assert_eq!(h.manager.session().negotiations_started(), 0);
}

#[tokio::test]
async fn test_attach_failure_keeps_stream_until_close() {
    let transport = FakeTransport {
        fail_attach: true,
        ..Default::default()
    };
    let h = harness(transport, FakeSignaling::answering());

    let err = h.manager.broadcast("").await.unwrap_err();

    assert!(matches!(err, SessionError::AttachStream(_)));
    assert!(h
        .log
        .lines()
        .iter()
        .any(|l| l.contains("Failed to attach local stream")));
    assert!(h.log.alerts().is_empty());
    assert!(h.signaling.requests().is_empty());
    assert_eq!(h.transport.count(&Call::CreateOffer), 0);
    assert!(h.manager.session().has_local_stream());
    assert!(h.capture.inner.is_capturing().await);

    h.manager.close().await.unwrap();

    assert!(!h.manager.session().has_local_stream());
    assert_eq!(h.capture.released(), vec!["camera".to_string()]);
    assert!(!h.capture.inner.is_capturing().await);
}

#[tokio::test]
async fn test_double_watch_runs_two_chains_on_one_connection() {
    let h = harness(FakeTransport::default(), FakeSignaling::answering());

    h.manager.watch("pub-1").await.unwrap();
    h.manager.watch("pub-2").await.unwrap();

    assert_eq!(h.transport.count(&Call::CreateOffer), 2);
    assert_eq!(h.signaling.requests().len(), 2);
    assert_eq!(h.manager.session().negotiations_started(), 2);
    assert_eq!(
        h.manager.session().publisher_key(),
        Some(PublisherKey::from("pub-2"))
    );
    assert_eq!(h.connected.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_every_transition_reaches_log_sink() {
    let h = harness(FakeTransport::default(), FakeSignaling::answering());

    for state in [
        ConnectivityState::New,
        ConnectivityState::Checking,
        ConnectivityState::Connected,
        ConnectivityState::Disconnected,
        ConnectivityState::Failed,
        ConnectivityState::Closed,
    ] {
        h.transport.emit_state(state);
    }

    assert_eq!(
        h.log.lines(),
        vec![
            "new",
            "checking",
            "connected",
            "disconnected",
            "failed",
            "closed"
        ]
    );
    assert_eq!(h.manager.connectivity(), ConnectivityState::Closed);
    // Observing a terminal state takes no action on the session.
    assert!(!h.manager.session().is_closed());
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn test_registry_tracks_and_closes_sessions() {
    let h = harness(FakeTransport::default(), FakeSignaling::answering());
    assert_eq!(h.registry.len(), 1);
    assert_eq!(h.registry.ids(), vec![h.manager.id().clone()]);

    let other = Arc::new(FakeTransport::default());
    let second = SessionManager::builder(other.clone())
        .signaling(Arc::new(FakeSignaling::answering()))
        .video_sink(Arc::new(RecordingVideoSink::default()))
        .log_sink(Arc::new(RecordingLogSink::default()))
        .registry(h.registry.clone())
        .build()
        .unwrap();
    assert_eq!(h.registry.len(), 2);

    let registered = h.registry.get(second.id()).unwrap();
    assert!(Arc::ptr_eq(&registered, second.session()));

    assert!(h.registry.close(second.id()).await.unwrap());
    assert!(h.registry.get(second.id()).is_none());
    assert!(!h.registry.close(second.id()).await.unwrap());
    assert_eq!(other.count(&Call::Close), 1);

    assert_eq!(h.registry.close_all().await, 1);
    assert!(h.registry.is_empty());
    assert!(h.manager.session().is_closed());
}

#[tokio::test]
async fn test_builder_requires_signaling_and_sinks() {
    let result = SessionManager::builder(Arc::new(FakeTransport::default()))
        .video_sink(Arc::new(RecordingVideoSink::default()))
        .log_sink(Arc::new(RecordingLogSink::default()))
        .build();
    assert!(result.is_err());

    let result = SessionManager::builder(Arc::new(FakeTransport::default()))
        .signaling(Arc::new(FakeSignaling::answering()))
        .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_inbound_track_event_carries_remote_playback() {
    let h = harness(FakeTransport::default(), FakeSignaling::answering());
    h.manager.watch("pub-1").await.unwrap();
    assert!(h.video.current().is_none());

    let track = SampleTrackCapture::new("remote", 30)
        .acquire_video()
        .await
        .unwrap()
        .tracks;
    assert!(matches!(track[0], MediaTrack::Local(_)));
    h.transport.emit_track(MediaStream::new("remote", track));

    assert_eq!(
        h.video.current(),
        Some(("remote".to_string(), Playback::remote()))
    );
}

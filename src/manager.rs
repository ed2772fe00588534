use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::error::{SessionError, Surface};
use crate::id_types::{PublisherKey, SessionId};
use crate::media::{MediaCapture, SampleTrackCapture};
use crate::metrics::{
    CLIENT_CONNECTIVITY_TRANSITIONS_TOTAL, CLIENT_NEGOTIATIONS_STARTED_TOTAL,
    CLIENT_NEGOTIATION_FAILURES_TOTAL, CLIENT_SESSIONS_CONNECTED_TOTAL,
};
use crate::registry::SessionRegistry;
use crate::session::PeerSession;
use crate::signaling::{HttpSignaling, SignalingChannel, SignalingRequest};
use crate::signaling_handler::{create_and_gather_offer, exchange_offer, guarded};
use crate::sink::{LogSink, VideoSink};
use crate::track_handler::attach_track_handler;
use crate::transport::{PeerTransport, RtcTransport};
use crate::types::{ConnectivityState, OnConnected, Playback, Role};

/// Deadlines applied to the two waits of a negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationOptions {
    pub gather_timeout: Duration,
    pub signaling_timeout: Duration,
}

impl Default for NegotiationOptions {
    fn default() -> Self {
        let config = Config::default();
        NegotiationOptions::from(&config)
    }
}

impl From<&Config> for NegotiationOptions {
    fn from(config: &Config) -> Self {
        NegotiationOptions {
            gather_timeout: config.ice_gather_timeout,
            signaling_timeout: config.signaling_timeout,
        }
    }
}

/// Owns one peer session and negotiates it as publisher or viewer.
///
/// Calling `broadcast`/`watch` more than once on the same manager starts a
/// second chain against the same connection; nothing prevents it.
pub struct SessionManager {
    session: Arc<PeerSession>,
    signaling: Arc<dyn SignalingChannel>,
    media: Arc<dyn MediaCapture>,
    video_sink: Arc<dyn VideoSink>,
    log_sink: Arc<dyn LogSink>,
    on_connected: Option<OnConnected>,
    options: NegotiationOptions,
    registry: Option<SessionRegistry>,
}

pub struct SessionManagerBuilder {
    transport: Arc<dyn PeerTransport>,
    session_id: Option<SessionId>,
    signaling: Option<Arc<dyn SignalingChannel>>,
    media: Option<Arc<dyn MediaCapture>>,
    video_sink: Option<Arc<dyn VideoSink>>,
    log_sink: Option<Arc<dyn LogSink>>,
    on_connected: Option<OnConnected>,
    options: NegotiationOptions,
    registry: Option<SessionRegistry>,
}

impl SessionManagerBuilder {
    pub fn session_id(mut self, id: SessionId) -> Self {
        self.session_id = Some(id);
        self
    }

    pub fn signaling(mut self, signaling: Arc<dyn SignalingChannel>) -> Self {
        self.signaling = Some(signaling);
        self
    }

    pub fn media(mut self, media: Arc<dyn MediaCapture>) -> Self {
        self.media = Some(media);
        self
    }

    pub fn video_sink(mut self, sink: Arc<dyn VideoSink>) -> Self {
        self.video_sink = Some(sink);
        self
    }

    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn on_connected(mut self, callback: OnConnected) -> Self {
        self.on_connected = Some(callback);
        self
    }

    pub fn options(mut self, options: NegotiationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(mut self, registry: SessionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Creates the session and registers the connectivity observer.
    pub fn build(self) -> anyhow::Result<SessionManager> {
        let signaling = self
            .signaling
            .ok_or_else(|| anyhow::anyhow!("a signaling channel is required"))?;
        let video_sink = self
            .video_sink
            .ok_or_else(|| anyhow::anyhow!("a video sink is required"))?;
        let log_sink = self
            .log_sink
            .ok_or_else(|| anyhow::anyhow!("a log sink is required"))?;

        let id = self.session_id.unwrap_or_else(SessionId::generate);
        let media = self
            .media
            .unwrap_or_else(|| {
                Arc::new(SampleTrackCapture::new(id.to_string(), 30)) as Arc<dyn MediaCapture>
            });

        let session = Arc::new(PeerSession::new(id, self.transport));
        register_connectivity_observer(&session, log_sink.clone());

        if let Some(registry) = &self.registry {
            registry.register(session.clone());
        }
        info!(session_id = %session.id(), "[Client] Session created");

        Ok(SessionManager {
            session,
            signaling,
            media,
            video_sink,
            log_sink,
            on_connected: self.on_connected,
            options: self.options,
            registry: self.registry,
        })
    }
}

/// Every transition goes to the log sink, terminal ones included.
fn register_connectivity_observer(session: &Arc<PeerSession>, log_sink: Arc<dyn LogSink>) {
    let weak: Weak<PeerSession> = Arc::downgrade(session);
    let session_id = session.id().clone();
    session
        .transport()
        .on_connectivity_change(Box::new(move |state: ConnectivityState| {
            info!(session_id = %session_id, state = %state, "[Client] ICE Connection State changed");
            CLIENT_CONNECTIVITY_TRANSITIONS_TOTAL
                .with_label_values(&[state.as_str()])
                .inc();
            if let Some(session) = weak.upgrade() {
                session.set_connectivity(state);
            }
            log_sink.append(state.as_str());
        }));
}

impl SessionManager {
    pub fn builder(transport: Arc<dyn PeerTransport>) -> SessionManagerBuilder {
        SessionManagerBuilder {
            transport,
            session_id: None,
            signaling: None,
            media: None,
            video_sink: None,
            log_sink: None,
            on_connected: None,
            options: NegotiationOptions::default(),
            registry: None,
        }
    }

    /// Builds a manager on a webrtc peer connection and the HTTP endpoint
    /// named in `config`.
    pub async fn connect(
        config: &Config,
        session_id: SessionId,
        video_sink: Arc<dyn VideoSink>,
        log_sink: Arc<dyn LogSink>,
        on_connected: Option<OnConnected>,
        registry: Option<SessionRegistry>,
    ) -> anyhow::Result<Self> {
        let transport = RtcTransport::new(&config.ice_servers).await?;
        let mut builder = SessionManager::builder(Arc::new(transport))
            .session_id(session_id)
            .signaling(Arc::new(HttpSignaling::new(config.signaling_url.clone())))
            .video_sink(video_sink)
            .log_sink(log_sink)
            .options(NegotiationOptions::from(config));
        if let Some(callback) = on_connected {
            builder = builder.on_connected(callback);
        }
        if let Some(registry) = registry {
            builder = builder.registry(registry);
        }
        builder.build()
    }

    pub fn id(&self) -> &SessionId {
        self.session.id()
    }

    pub fn session(&self) -> &Arc<PeerSession> {
        &self.session
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.session.connectivity()
    }

    /// Publishes local camera video under `publisher_key`.
    pub async fn broadcast(
        &self,
        publisher_key: impl Into<PublisherKey>,
    ) -> Result<(), SessionError> {
        let publisher_key = publisher_key.into();
        let result = self.run_publisher(&publisher_key).await;
        self.conclude(Role::Publisher, &publisher_key, result)
    }

    /// Receives the stream published under `publisher_key`.
    pub async fn watch(&self, publisher_key: impl Into<PublisherKey>) -> Result<(), SessionError> {
        let publisher_key = publisher_key.into();
        let result = self.run_viewer(&publisher_key).await;
        self.conclude(Role::Viewer, &publisher_key, result)
    }

    /// Cancels any negotiation in flight, releases captured media and the
    /// connection, and drops the session from the registry.
    pub async fn close(&self) -> anyhow::Result<()> {
        if let Some(registry) = &self.registry {
            registry.remove(self.session.id());
        }
        self.session.close().await
    }

    async fn run_publisher(&self, publisher_key: &PublisherKey) -> Result<(), SessionError> {
        self.ensure_open()?;
        let cancel = self.session.cancel_signal();
        let transport = self.session.transport();

        let stream = guarded(cancel, async {
            self.media
                .acquire_video()
                .await
                .map_err(|e| SessionError::MediaAcquisition(format!("{:#}", e)))
        })
        .await?;
        info!(
            session_id = %self.session.id(),
            stream_id = %stream.id,
            "[Client] Local video acquired"
        );

        self.session
            .hold_local_stream(stream.clone(), self.media.clone())
            .await;

        self.video_sink.display(stream.clone(), Playback::preview());
        guarded(cancel, async {
            transport
                .add_local_stream(&stream)
                .await
                .map_err(|e| SessionError::AttachStream(format!("{:#}", e)))
        })
        .await?;

        self.negotiate(Role::Publisher, publisher_key).await
    }

    async fn run_viewer(&self, publisher_key: &PublisherKey) -> Result<(), SessionError> {
        self.ensure_open()?;
        let cancel = self.session.cancel_signal();
        let transport = self.session.transport();

        guarded(cancel, async {
            transport
                .add_recvonly_video()
                .await
                .map_err(|e| SessionError::Transceiver(format!("{:#}", e)))
        })
        .await?;

        attach_track_handler(transport, self.session.id().clone(), self.video_sink.clone());

        self.negotiate(Role::Viewer, publisher_key).await
    }

    /// Offer, gather, POST, apply answer. Strictly in that order.
    async fn negotiate(&self, role: Role, publisher_key: &PublisherKey) -> Result<(), SessionError> {
        let previous = self.session.begin_negotiation(role, publisher_key);
        if previous > 0 {
            warn!(
                session_id = %self.session.id(),
                previous,
                "[Client] Negotiation already started on this connection, starting another"
            );
        }
        CLIENT_NEGOTIATIONS_STARTED_TOTAL
            .with_label_values(&[role.as_str()])
            .inc();

        let span = info_span!(
            "negotiate",
            session_id = %self.session.id(),
            role = %role,
            publisher_key = %publisher_key
        );

        async {
            let cancel = self.session.cancel_signal();
            let transport = self.session.transport();

            let local =
                create_and_gather_offer(transport, cancel, self.options.gather_timeout).await?;

            let request = SignalingRequest::new(local, role, publisher_key);
            let answer = exchange_offer(
                &self.signaling,
                &request,
                cancel,
                self.options.signaling_timeout,
            )
            .await?;

            guarded(cancel, async {
                transport
                    .set_remote_description(answer)
                    .await
                    .map_err(|e| SessionError::RemoteDescription(format!("{:#}", e)))
            })
            .await?;

            info!("[Client] Remote description applied");
            CLIENT_SESSIONS_CONNECTED_TOTAL.inc();
            if let Some(callback) = &self.on_connected {
                callback(self.session.id());
            }
            Ok::<(), SessionError>(())
        }
        .instrument(span)
        .await
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.session.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    /// Reports a failed attempt where the user will see it.
    fn conclude(
        &self,
        role: Role,
        publisher_key: &PublisherKey,
        result: Result<(), SessionError>,
    ) -> Result<(), SessionError> {
        let err = match &result {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        CLIENT_NEGOTIATION_FAILURES_TOTAL
            .with_label_values(&[err.kind()])
            .inc();
        let message = err.to_string();
        let session_id = self.session.id();

        match (err.surface(), err) {
            (Surface::Alert, _) => {
                error!(session_id = %session_id, role = %role, publisher_key = %publisher_key, error = %message, "[Client] Negotiation failed");
                self.log_sink.alert(&message);
            }
            (Surface::LogSink, _) => {
                error!(session_id = %session_id, role = %role, publisher_key = %publisher_key, error = %message, "[Client] Negotiation failed");
                self.log_sink.append(&message);
            }
            (Surface::Console, SessionError::Cancelled) => {
                debug!(session_id = %session_id, role = %role, "[Client] Negotiation cancelled");
            }
            (Surface::Console, SessionError::Closed) => {
                warn!(session_id = %session_id, role = %role, "[Client] Session already closed");
            }
            (Surface::Console, _) => {
                error!(session_id = %session_id, role = %role, publisher_key = %publisher_key, error = %message, "[Client] Signaling failed");
            }
        }
        result
    }
}

use crate::id_types::{PublisherKey, SessionId};
use crate::media::{MediaCapture, MediaStream};
use crate::transport::PeerTransport;
use crate::types::{ConnectivityState, Role};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{info, warn};

/// Captured stream plus the capture that feeds it.
struct HeldStream {
    stream: MediaStream,
    capture: Arc<dyn MediaCapture>,
}

impl HeldStream {
    async fn release(self, session_id: &SessionId) {
        match self.capture.release(&self.stream).await {
            Ok(()) => {
                info!(session_id = %session_id, stream_id = %self.stream.id, "[Client] Released local stream")
            }
            Err(e) => {
                warn!(session_id = %session_id, stream_id = %self.stream.id, error = %e, "[Client] Failed to release local stream")
            }
        }
    }
}

#[derive(Default)]
struct SessionState {
    role: Option<Role>,
    publisher_key: Option<PublisherKey>,
    connectivity: ConnectivityState,
    local_stream: Option<HeldStream>,
}

/// One peer connection plus what the manager knows about it.
pub struct PeerSession {
    id: SessionId,
    transport: Arc<dyn PeerTransport>,
    state: Mutex<SessionState>,
    cancel: watch::Sender<bool>,
    negotiations: AtomicU32,
    closed: AtomicBool,
}

impl PeerSession {
    pub fn new(id: SessionId, transport: Arc<dyn PeerTransport>) -> Self {
        PeerSession {
            id,
            transport,
            state: Mutex::new(SessionState::default()),
            cancel: watch::channel(false).0,
            negotiations: AtomicU32::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn transport(&self) -> &Arc<dyn PeerTransport> {
        &self.transport
    }

    /// Flips to `true` on close; every step of the negotiation chain is raced against it.
    pub fn cancel_signal(&self) -> &watch::Sender<bool> {
        &self.cancel
    }

    pub fn role(&self) -> Option<Role> {
        self.lock().role
    }

    pub fn publisher_key(&self) -> Option<PublisherKey> {
        self.lock().publisher_key.clone()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.lock().connectivity
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn negotiations_started(&self) -> u32 {
        self.negotiations.load(Ordering::SeqCst)
    }

    /// Records the role for a new negotiation and returns how many were
    /// started before it on this session.
    pub(crate) fn begin_negotiation(&self, role: Role, publisher_key: &PublisherKey) -> u32 {
        let mut state = self.lock();
        state.role = Some(role);
        state.publisher_key = Some(publisher_key.clone());
        self.negotiations.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn set_connectivity(&self, connectivity: ConnectivityState) {
        self.lock().connectivity = connectivity;
    }

    /// Keeps `stream` until close, releasing any stream it replaces. A
    /// stream handed over after close is released at once.
    pub(crate) async fn hold_local_stream(
        &self,
        stream: MediaStream,
        capture: Arc<dyn MediaCapture>,
    ) {
        let replaced = self
            .lock()
            .local_stream
            .replace(HeldStream { stream, capture });
        if let Some(held) = replaced {
            held.release(&self.id).await;
        }

        if self.is_closed() {
            let late = self.lock().local_stream.take();
            if let Some(held) = late {
                held.release(&self.id).await;
            }
        }
    }

    pub fn has_local_stream(&self) -> bool {
        self.lock().local_stream.is_some()
    }

    /// Cancels any in-flight negotiation, releases captured media and closes
    /// the transport. Later calls are no-ops.
    pub async fn close(&self) -> anyhow::Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.cancel.send_replace(true);

        let held = self.lock().local_stream.take();
        if let Some(held) = held {
            held.release(&self.id).await;
        }

        let result = self.transport.close().await;
        if let Err(e) = &result {
            warn!(session_id = %self.id, error = %e, "[Client] Transport close failed");
        }
        self.set_connectivity(ConnectivityState::Closed);
        info!(session_id = %self.id, "[Client] Session closed");
        result
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

use crate::id_types::SessionId;
use crate::metrics::CLIENT_ACTIVE_SESSIONS;
use crate::session::PeerSession;
use crate::types::SessionMap;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

/// Open sessions keyed by id, for cleanup and inspection.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: SessionMap,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Adds a session. Returns false if the id was already present.
    pub fn register(&self, session: Arc<PeerSession>) -> bool {
        let id = session.id().clone();
        let inserted = self.sessions.insert(id.clone(), session).is_none();
        if inserted {
            CLIENT_ACTIVE_SESSIONS.inc();
            info!(session_id = %id, "[Client] Session registered");
        }
        inserted
    }

    /// Drops the entry without closing the session.
    pub fn remove(&self, id: &SessionId) -> Option<Arc<PeerSession>> {
        let removed = self.sessions.remove(id).map(|(_, session)| session);
        if removed.is_some() {
            CLIENT_ACTIVE_SESSIONS.dec();
        }
        removed
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<PeerSession>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Closes and removes one session. Returns false if it was unknown.
    pub async fn close(&self, id: &SessionId) -> anyhow::Result<bool> {
        match self.remove(id) {
            Some(session) => {
                session.close().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Closes every registered session, returning how many were closed.
    pub async fn close_all(&self) -> usize {
        let ids: Vec<SessionId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let mut closed = 0;
        for id in ids {
            if let Some(session) = self.remove(&id) {
                // Close errors are already logged by the session.
                let _ = session.close().await;
                closed += 1;
            }
        }
        closed
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

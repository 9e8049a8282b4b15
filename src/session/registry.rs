//! Live-session registry.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque identity of one live session.
pub type SessionId = Uuid;

/// The set of live sessions, mapping session identity to the outbound
/// channel handle.
///
/// Only the session manager writes to it: a session is inserted once on
/// handshake and removed exactly once on close. Removal is idempotent;
/// removing an absent session is a no-op, so a disconnect observed from two
/// code paths cannot corrupt the count.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, mpsc::Sender<String>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened session and return its identity.
    pub fn insert(&self, sender: mpsc::Sender<String>) -> SessionId {
        let id = Uuid::new_v4();
        self.sessions.write().insert(id, sender);
        tracing::info!(session = %id, active = self.len(), "session opened");
        id
    }

    /// Remove a closed session. Idempotent.
    pub fn remove(&self, id: &SessionId) {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session = %id, active = self.len(), "session closed");
        }
    }

    /// The outbound sender for a session, if it is still live.
    pub fn sender(&self, id: &SessionId) -> Option<mpsc::Sender<String>> {
        self.sessions.read().get(id).cloned()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

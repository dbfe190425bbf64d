//! In-process registry of live interview sessions.

use crate::error::{InterviewError, Result};
use crate::interview::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Shared handle to one session. Turns on the same session serialize on the
/// inner mutex; different sessions never contend.
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its shared handle.
    pub async fn insert(&self, session: Session) -> SessionHandle {
        let id = session.id().to_string();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id.clone(), handle.clone());
        debug!(session_id = %id, "Session registered");
        handle
    }

    pub async fn get(&self, session_id: &str) -> Result<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| InterviewError::SessionNotFound(session_id.to_string()))
    }

    pub async fn remove(&self, session_id: &str) -> Result<SessionHandle> {
        let removed = self.sessions.write().await.remove(session_id);
        debug!(session_id, found = removed.is_some(), "Session removed");
        removed.ok_or_else(|| InterviewError::SessionNotFound(session_id.to_string()))
    }

    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

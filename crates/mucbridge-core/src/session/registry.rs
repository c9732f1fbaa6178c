//! Process-wide session registry.
//!
//! The only state shared between sessions. Backed by a `DashMap`, so
//! concurrent creation, lookup and removal need no outer lock.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use mucbridge_types::error::BridgeError;
use mucbridge_types::session::SessionId;
use tracing::debug;

use super::Session;
use crate::id;

pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Session>>,
    channel_capacity: usize,
}

impl SessionRegistry {
    /// Create an empty registry whose sessions get channels of `channel_capacity`.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Allocate, register and return a new session.
    ///
    /// The id is inserted through the map's entry API; a colliding id is
    /// regenerated rather than overwriting a live session.
    pub fn create(&self, identity: &str) -> (SessionId, Arc<Session>) {
        loop {
            let id = SessionId::new(id::session_id());
            if let Entry::Vacant(slot) = self.sessions.entry(id.clone()) {
                let session = Arc::new(Session::new(id.clone(), self.channel_capacity, identity));
                slot.insert(session.clone());
                debug!(session_id = %id, "session registered");
                return (id, session);
            }
        }
    }

    /// Find a session by id.
    pub fn lookup(&self, id: &str) -> Result<Arc<Session>, BridgeError> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BridgeError::SessionNotFound(id.to_string()))
    }

    /// Remove a session, returning it if it was registered.
    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        let removed = self.sessions.remove(id).map(|(_, session)| session);
        if removed.is_some() {
            debug!(session_id = %id, "session unregistered");
        }
        removed
    }

    /// Sessions with no transport attached that have been idle longer than `max_idle`.
    pub fn idle_sessions(&self, max_idle: Duration) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|entry| !entry.is_attached() && entry.idle_for() > max_idle)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

//! Session lifecycle events for the bridge event bus.
//!
//! `BridgeEvent` is broadcast whenever a session changes hands or fails.
//! All variants are Clone + Send + Sync for use with tokio broadcast channels.

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// A session was registered and its chat connection started.
    SessionCreated { session_id: SessionId },

    /// A WebSocket attached to the session.
    SessionAttached { session_id: SessionId },

    /// The WebSocket went away; the session stays registered.
    SessionDetached { session_id: SessionId },

    /// The chat side of the session failed. The session is torn down.
    SessionFailed { session_id: SessionId, reason: String },

    /// The session was removed from the registry.
    SessionClosed {
        session_id: SessionId,
        /// Envelopes still queued in either direction when it closed.
        discarded: usize,
    },
}

impl BridgeEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            BridgeEvent::SessionCreated { session_id }
            | BridgeEvent::SessionAttached { session_id }
            | BridgeEvent::SessionDetached { session_id }
            | BridgeEvent::SessionFailed { session_id, .. }
            | BridgeEvent::SessionClosed { session_id, .. } => session_id,
        }
    }
}

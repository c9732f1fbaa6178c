//! Protocol-neutral chat model.
//!
//! These types sit between the relay core and the XMPP implementation in
//! `mucbridge-infra`. Addresses are kept as strings; the infra layer parses
//! them into JIDs when it builds stanzas.

use serde::{Deserialize, Serialize};

/// An outgoing group-chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSend {
    /// Stanza id, unique per message sent by a session.
    pub id: String,
    /// Bound identity of the sending connection.
    pub from: String,
    /// Room (or occupant) address the message is addressed to.
    pub to: String,
    pub body: String,
}

/// The presence that joins the shared room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomJoin {
    pub id: String,
    pub from: String,
    /// Occupant address: `room@service/nickname`.
    pub to: String,
}

impl RoomJoin {
    /// Nickname part of the occupant address.
    pub fn nickname(&self) -> &str {
        self.to.split_once('/').map(|(_, nick)| nick).unwrap_or("")
    }
}

/// A message stanza received from the chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Full sender address; for group chat this is `room@service/nick`.
    pub from: String,
    /// `None` for body-less messages (chat states, subject changes).
    pub body: Option<String>,
}

/// Everything a chat connection reports back to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The stream is authenticated and bound; the room can be joined.
    Online { bound_identity: String },
    /// The stream dropped. The connection reconnects on its own.
    Disconnected { reason: String },
    Message(IncomingMessage),
    Presence { from: String },
    Error { reason: String },
}

impl ChatEvent {
    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::Online { .. } => "online",
            ChatEvent::Disconnected { .. } => "disconnected",
            ChatEvent::Message(_) => "message",
            ChatEvent::Presence { .. } => "presence",
            ChatEvent::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_join_nickname() {
        let join = RoomJoin {
            id: "1".into(),
            from: "bridge@example.org/res".into(),
            to: "lobby@conference.example.org/bot-1".into(),
        };
        assert_eq!(join.nickname(), "bot-1");
    }

    #[test]
    fn room_join_without_resource_has_empty_nickname() {
        let join = RoomJoin {
            id: "1".into(),
            from: String::new(),
            to: "lobby@conference.example.org".into(),
        };
        assert_eq!(join.nickname(), "");
    }

    #[test]
    fn event_names() {
        assert_eq!(
            ChatEvent::Presence {
                from: "a@b".into()
            }
            .name(),
            "presence"
        );
        assert_eq!(
            ChatEvent::Message(IncomingMessage {
                from: "a@b".into(),
                body: None
            })
            .name(),
            "message"
        );
    }
}

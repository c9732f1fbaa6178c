//! The WebSocket wire envelope exchanged with browser clients.
//!
//! On the wire an envelope is a JSON object carrying a numeric `messageType`
//! tag and exactly one payload object:
//!
//! ```json
//! { "messageType": 0, "ctrlMessage": { "action": "ping" } }
//! { "messageType": 1, "xmppMessage": { "to": "room@conference.example.org", "body": "hi" } }
//! ```
//!
//! In Rust the envelope is the sum type [`Envelope`]. Decoding goes through
//! [`WireEnvelope`], so a frame whose tag and payload disagree never becomes
//! an `Envelope` at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discriminant of an [`Envelope`], as carried in `messageType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Control,
    Chat,
}

impl EnvelopeKind {
    /// Numeric tag used on the wire.
    pub fn tag(self) -> u8 {
        match self {
            EnvelopeKind::Control => 0,
            EnvelopeKind::Chat => 1,
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(EnvelopeKind::Control),
            1 => Some(EnvelopeKind::Chat),
            _ => None,
        }
    }
}

/// A control instruction. Inbound actions are advisory and currently not
/// interpreted by the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPayload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,
}

impl ControlPayload {
    /// Sent to an attached client when its session fails and is torn down.
    pub const SESSION_FAILED: &'static str = "session_failed";
}

/// The semantic fields of one chat message.
///
/// Empty strings are omitted on the wire and treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to: String,
    /// Room-qualified nickname of the sender (`room@service/nick`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub handle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// One unit of the bridge's WebSocket protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub enum Envelope {
    Control(ControlPayload),
    Chat(ChatPayload),
}

impl Envelope {
    /// Build a control envelope.
    pub fn control(action: impl Into<String>) -> Self {
        Envelope::Control(ControlPayload {
            action: action.into(),
        })
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::Control(_) => EnvelopeKind::Control,
            Envelope::Chat(_) => EnvelopeKind::Chat,
        }
    }

    /// Decode one JSON text frame.
    pub fn decode(text: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(text).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }
}

/// Field-presence form of an envelope, exactly as it appears in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    pub message_type: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctrl_message: Option<ControlPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmpp_message: Option<ChatPayload>,
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        let kind = EnvelopeKind::from_tag(wire.message_type)
            .ok_or(EnvelopeError::UnknownKind(wire.message_type))?;

        match (kind, wire.ctrl_message, wire.xmpp_message) {
            (EnvelopeKind::Control, Some(ctrl), None) => Ok(Envelope::Control(ctrl)),
            (EnvelopeKind::Chat, None, Some(chat)) => Ok(Envelope::Chat(chat)),
            (kind, None, None) => Err(EnvelopeError::MissingPayload(kind)),
            (kind, _, _) => Err(EnvelopeError::ConflictingPayload(kind)),
        }
    }
}

impl From<Envelope> for WireEnvelope {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Control(ctrl) => WireEnvelope {
                message_type: EnvelopeKind::Control.tag(),
                ctrl_message: Some(ctrl),
                xmpp_message: None,
            },
            Envelope::Chat(chat) => WireEnvelope {
                message_type: EnvelopeKind::Chat.tag(),
                ctrl_message: None,
                xmpp_message: Some(chat),
            },
        }
    }
}

/// Why a frame could not be turned into an [`Envelope`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("unknown messageType {0}")]
    UnknownKind(u8),

    #[error("{0:?} envelope has no payload")]
    MissingPayload(EnvelopeKind),

    #[error("{0:?} envelope carries a payload that does not match its messageType")]
    ConflictingPayload(EnvelopeKind),

    #[error("malformed envelope: {0}")]
    Malformed(String),
}

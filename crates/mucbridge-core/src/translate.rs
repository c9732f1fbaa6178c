//! Translation between wire envelopes and the chat model.

use mucbridge_types::chat::{ChatEvent, ChatSend, RoomJoin};
use mucbridge_types::envelope::{ChatPayload, Envelope};
use mucbridge_types::error::TranslationError;

use crate::id;

/// Build a group-chat send from a client payload.
///
/// `sender` is the session's bound identity. The body is copied verbatim and
/// must be non-empty, as must the destination.
pub fn to_chat_send(payload: &ChatPayload, sender: &str) -> Result<ChatSend, TranslationError> {
    if payload.body.is_empty() {
        return Err(TranslationError::InvalidPayload("body"));
    }
    if payload.to.is_empty() {
        return Err(TranslationError::InvalidPayload("to"));
    }

    Ok(ChatSend {
        id: id::stanza_id(),
        from: sender.to_string(),
        to: payload.to.clone(),
        body: payload.body.clone(),
    })
}

/// Map an inbound chat event to the envelope forwarded to the client.
///
/// Only messages with a body are forwarded. Presence, errors and connection
/// lifecycle events have no representation in the client schema and yield
/// `None`. The `from` field stays empty: the sender is identified by
/// `handle`, its room-qualified nickname.
pub fn from_chat_event(event: &ChatEvent, bound_identity: &str) -> Option<Envelope> {
    let ChatEvent::Message(message) = event else {
        return None;
    };
    let body = message.body.as_ref()?;

    Some(Envelope::Chat(ChatPayload {
        from: String::new(),
        to: bound_identity.to_string(),
        handle: message.from.clone(),
        body: body.clone(),
    }))
}

/// Build the presence that joins `room` as `{nickname_prefix}-{id}`.
pub fn room_join(room: &str, nickname_prefix: &str, sender: &str) -> RoomJoin {
    let id = id::stanza_id();
    RoomJoin {
        to: format!("{room}/{nickname_prefix}-{id}"),
        from: sender.to_string(),
        id,
    }
}

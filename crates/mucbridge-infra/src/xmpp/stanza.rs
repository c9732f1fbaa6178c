//! Conversion between the chat model and XMPP stanzas.

use mucbridge_types::chat::{ChatEvent, ChatSend, IncomingMessage, RoomJoin};
use mucbridge_types::error::ChatError;
use tokio_xmpp::parsers::message::{Body, Message, MessageType};
use tokio_xmpp::parsers::muc::Muc;
use tokio_xmpp::parsers::presence::{self, Presence};
use tokio_xmpp::parsers::{Element, Jid};

/// Parse an address into a JID.
pub fn parse_jid(address: &str) -> Result<Jid, ChatError> {
    address.parse::<Jid>().map_err(|err| ChatError::InvalidAddress {
        address: address.to_string(),
        reason: err.to_string(),
    })
}

/// `<message type="groupchat">` carrying the body.
pub fn group_message(send: &ChatSend) -> Result<Element, ChatError> {
    let mut message = Message::new(Some(parse_jid(&send.to)?));
    message.type_ = MessageType::Groupchat;
    message.id = Some(send.id.clone());
    message.from = send.from.parse::<Jid>().ok();
    message
        .bodies
        .insert(String::new(), Body(send.body.clone()));
    Ok(message.into())
}

/// Available presence to the occupant address, with the MUC `<x/>` payload.
pub fn join_presence(join: &RoomJoin) -> Result<Element, ChatError> {
    let mut presence = Presence::new(presence::Type::None);
    presence.to = Some(parse_jid(&join.to)?);
    presence.from = join.from.parse::<Jid>().ok();
    presence.id = Some(join.id.clone());
    presence.payloads.push(Muc::new().into());
    Ok(presence.into())
}

/// Map a received stanza to a chat event. Iq and unparseable stanzas yield
/// `None`.
pub fn chat_event(element: Element) -> Option<ChatEvent> {
    match element.name() {
        "message" => {
            let message = match Message::try_from(element) {
                Ok(message) => message,
                Err(err) => {
                    tracing::debug!(error = %err, "ignoring unparseable message stanza");
                    return None;
                }
            };
            let from = message.from.as_ref().map(ToString::to_string).unwrap_or_default();
            if message.type_ == MessageType::Error {
                return Some(ChatEvent::Error {
                    reason: format!("message error from {from}"),
                });
            }
            Some(ChatEvent::Message(IncomingMessage {
                from,
                body: message.bodies.values().next().map(|body| body.0.clone()),
            }))
        }
        "presence" => {
            let from = element.attr("from").unwrap_or_default().to_string();
            if element.attr("type") == Some("error") {
                return Some(ChatEvent::Error {
                    reason: format!("presence error from {from}"),
                });
            }
            Some(ChatEvent::Presence { from })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_xmpp::parsers::ns;

    #[test]
    fn group_message_stanza() {
        let element = group_message(&ChatSend {
            id: "m1".into(),
            from: "bridge@example.org/res".into(),
            to: "room@conference.example.org".into(),
            body: "hello".into(),
        })
        .unwrap();

        assert_eq!(element.name(), "message");
        assert_eq!(element.attr("type"), Some("groupchat"));
        assert_eq!(element.attr("to"), Some("room@conference.example.org"));
        assert_eq!(element.attr("id"), Some("m1"));
        let body = element.get_child("body", ns::DEFAULT_NS).unwrap();
        assert_eq!(body.text(), "hello");
    }

    #[test]
    fn group_message_rejects_bad_address() {
        let err = group_message(&ChatSend {
            id: "m1".into(),
            from: String::new(),
            to: "@@".into(),
            body: "hello".into(),
        })
        .unwrap_err();
        assert!(matches!(err, ChatError::InvalidAddress { .. }));
    }

    #[test]
    fn join_presence_carries_muc_payload() {
        let element = join_presence(&RoomJoin {
            id: "p1".into(),
            from: "bridge@example.org/res".into(),
            to: "lobby@conference.example.org/bot-p1".into(),
        })
        .unwrap();

        assert_eq!(element.name(), "presence");
        assert_eq!(element.attr("to"), Some("lobby@conference.example.org/bot-p1"));
        assert_eq!(element.attr("type"), None);
        assert!(element.has_child("x", ns::MUC));
    }

    #[test]
    fn inbound_groupchat_message() {
        let element: Element = "<message xmlns='jabber:client' type='groupchat' \
             from='lobby@conference.example.org/alice' to='bridge@example.org/res'>\
             <body>hi</body></message>"
            .parse()
            .unwrap();

        assert_eq!(
            chat_event(element),
            Some(ChatEvent::Message(IncomingMessage {
                from: "lobby@conference.example.org/alice".into(),
                body: Some("hi".into()),
            }))
        );
    }

    #[test]
    fn inbound_message_without_body() {
        let element: Element = "<message xmlns='jabber:client' type='groupchat' \
             from='lobby@conference.example.org/alice'/>"
            .parse()
            .unwrap();

        match chat_event(element) {
            Some(ChatEvent::Message(message)) => assert_eq!(message.body, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inbound_presence_and_iq() {
        let presence: Element =
            "<presence xmlns='jabber:client' from='lobby@conference.example.org/bob'/>"
                .parse()
                .unwrap();
        assert_eq!(
            chat_event(presence),
            Some(ChatEvent::Presence {
                from: "lobby@conference.example.org/bob".into()
            })
        );

        let iq: Element = "<iq xmlns='jabber:client' type='get' id='q1'/>"
            .parse()
            .unwrap();
        assert_eq!(chat_event(iq), None);
    }
}

//! Chat connector stand-in for handler tests.

use mucbridge_core::chat::{ChatConnector, ChatEventHandler, ChatLink};
use mucbridge_types::chat::{ChatSend, RoomJoin};
use mucbridge_types::error::ChatError;

/// Accepts every connection and drops everything sent to it.
pub struct NullConnector;

pub struct NullLink;

impl ChatLink for NullLink {
    async fn send_message(&self, _message: ChatSend) -> Result<(), ChatError> {
        Ok(())
    }
    async fn join_room(&self, _join: RoomJoin) -> Result<(), ChatError> {
        Ok(())
    }
    async fn close(&self) {}
}

impl ChatConnector for NullConnector {
    type Link = NullLink;

    fn identity(&self) -> &str {
        "bridge@example.org"
    }

    async fn connect(&self, _handler: ChatEventHandler) -> Result<NullLink, ChatError> {
        Ok(NullLink)
    }
}

//! `ChatLink` and `ChatConnector` trait definitions.
//!
//! Uses native async fn in traits (RPITIT). `DynChatLink` provides the
//! object-safe wrapper the session stores.

use std::future::Future;

use mucbridge_types::chat::{ChatSend, RoomJoin};
use mucbridge_types::error::ChatError;

use super::handler::ChatEventHandler;

/// One live chat-protocol connection owned by a session.
///
/// Implementations handle reconnection themselves and report connection
/// lifecycle through the [`ChatEventHandler`] they were created with. While
/// the connection is between streams, sends fail with
/// [`ChatError::NotConnected`] instead of waiting.
pub trait ChatLink: Send + Sync {
    /// Send a group-chat message.
    fn send_message(&self, message: ChatSend)
    -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Send the presence that joins the shared room.
    fn join_room(&self, join: RoomJoin) -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Close the connection. Idempotent.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Factory for chat connections, configured with process-wide credentials.
pub trait ChatConnector: Send + Sync {
    type Link: ChatLink + 'static;

    /// Identity used as sender until the connection reports its bound one.
    fn identity(&self) -> &str;

    /// Start a connection that reports every inbound event to `handler`.
    ///
    /// Returns once the connection is constructed; it comes online
    /// asynchronously and signals that with `ChatEvent::Online`.
    fn connect(
        &self,
        handler: ChatEventHandler,
    ) -> impl Future<Output = Result<Self::Link, ChatError>> + Send;
}

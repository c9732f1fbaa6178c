//! DynChatLink -- object-safe, shareable wrapper for ChatLink.
//!
//! 1. Define an object-safe `ChatLinkDyn` trait with boxed futures
//! 2. Blanket-impl `ChatLinkDyn` for all `T: ChatLink`
//! 3. `DynChatLink` wraps `Arc<dyn ChatLinkDyn>` and delegates

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mucbridge_types::chat::{ChatSend, RoomJoin};
use mucbridge_types::error::ChatError;

use super::link::ChatLink;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`ChatLink`] with boxed futures.
pub trait ChatLinkDyn: Send + Sync {
    fn send_message_boxed(&self, message: ChatSend) -> BoxFuture<'_, Result<(), ChatError>>;

    fn join_room_boxed(&self, join: RoomJoin) -> BoxFuture<'_, Result<(), ChatError>>;

    fn close_boxed(&self) -> BoxFuture<'_, ()>;
}

impl<T: ChatLink> ChatLinkDyn for T {
    fn send_message_boxed(&self, message: ChatSend) -> BoxFuture<'_, Result<(), ChatError>> {
        Box::pin(self.send_message(message))
    }

    fn join_room_boxed(&self, join: RoomJoin) -> BoxFuture<'_, Result<(), ChatError>> {
        Box::pin(self.join_room(join))
    }

    fn close_boxed(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.close())
    }
}

/// Type-erased chat link held by a session.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct DynChatLink {
    inner: Arc<dyn ChatLinkDyn>,
}

impl DynChatLink {
    pub fn new<T: ChatLink + 'static>(link: T) -> Self {
        Self {
            inner: Arc::new(link),
        }
    }

    pub async fn send_message(&self, message: ChatSend) -> Result<(), ChatError> {
        self.inner.send_message_boxed(message).await
    }

    pub async fn join_room(&self, join: RoomJoin) -> Result<(), ChatError> {
        self.inner.join_room_boxed(join).await
    }

    pub async fn close(&self) {
        self.inner.close_boxed().await
    }
}

impl std::fmt::Debug for DynChatLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynChatLink").finish_non_exhaustive()
    }
}

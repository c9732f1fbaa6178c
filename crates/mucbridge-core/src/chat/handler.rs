use std::fmt;
use std::sync::Arc;

use mucbridge_types::chat::ChatEvent;

/// Callback a chat connection invokes for every inbound event.
///
/// Runs on the chat connection's own task, outside the relay's scheduling.
/// Implementations must only enqueue and never wait on transport I/O.
#[derive(Clone)]
pub struct ChatEventHandler {
    inner: Arc<dyn Fn(ChatEvent) + Send + Sync>,
}

impl ChatEventHandler {
    pub fn new(f: impl Fn(ChatEvent) + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(f) }
    }

    pub fn dispatch(&self, event: ChatEvent) {
        (self.inner)(event);
    }
}

impl fmt::Debug for ChatEventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatEventHandler").finish_non_exhaustive()
    }
}

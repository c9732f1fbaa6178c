//! Sessions and the process-wide session registry.
//!
//! A [`Session`] binds one WebSocket attachment to one chat connection. It
//! owns two bounded channels:
//!
//! - **inbound** (client -> chat): filled by the inbound pump, drained in
//!   order by the session's chat-send task.
//! - **outbound** (chat -> client): filled by the chat event handler, drained
//!   in order by the outbound pump of whichever transport is attached.
//!
//! Each direction has exactly one producer and one consumer, which is what
//! gives FIFO delivery per direction without further locking.

pub mod registry;

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::Duration;

use mucbridge_types::envelope::Envelope;
use mucbridge_types::error::BridgeError;
use mucbridge_types::session::{SessionId, SessionState};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::chat::DynChatLink;

pub use registry::SessionRegistry;

pub struct Session {
    id: SessionId,
    inbound_tx: mpsc::Sender<Envelope>,
    /// Held by the chat-send task while it runs.
    inbound_rx: Mutex<Option<mpsc::Receiver<Envelope>>>,
    outbound_tx: mpsc::Sender<Envelope>,
    /// Held by the attached transport; `None` while attached.
    outbound_rx: Mutex<Option<mpsc::Receiver<Envelope>>>,
    attached: AtomicBool,
    chat: OnceLock<DynChatLink>,
    bound_identity: RwLock<String>,
    state: watch::Sender<SessionState>,
    cancel: CancellationToken,
    created_at: Instant,
    /// Milliseconds after `created_at` of the last client activity.
    last_activity_ms: AtomicU64,
    dropped_outbound: AtomicUsize,
}

impl Session {
    /// Create a session with two channels of `capacity` each.
    ///
    /// `identity` is the sender identity used until the chat connection
    /// reports the one the server bound.
    pub fn new(id: SessionId, capacity: usize, identity: impl Into<String>) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let (state, _) = watch::channel(SessionState::Created);

        Self {
            id,
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            attached: AtomicBool::new(false),
            chat: OnceLock::new(),
            bound_identity: RwLock::new(identity.into()),
            state,
            cancel: CancellationToken::new(),
            created_at: Instant::now(),
            last_activity_ms: AtomicU64::new(0),
            dropped_outbound: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Move to `next`. Terminal states are never left.
    pub fn set_state(&self, next: SessionState) -> bool {
        self.state.send_if_modified(|current| {
            if current.is_terminal() || *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Token cancelled when the session is torn down.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub fn bound_identity(&self) -> String {
        match self.bound_identity.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_bound_identity(&self, identity: impl Into<String>) {
        let identity = identity.into();
        match self.bound_identity.write() {
            Ok(mut guard) => *guard = identity,
            Err(poisoned) => *poisoned.into_inner() = identity,
        }
    }

    /// Install the chat connection. Returns `false` if one was already set.
    pub fn set_chat_link(&self, link: DynChatLink) -> bool {
        self.chat.set(link).is_ok()
    }

    pub fn chat_link(&self) -> Option<&DynChatLink> {
        self.chat.get()
    }

    /// Queue an envelope for the chat side, waiting for capacity.
    pub async fn push_inbound(&self, envelope: Envelope) -> Result<(), BridgeError> {
        self.inbound_tx
            .send(envelope)
            .await
            .map_err(|_| BridgeError::SessionClosed(self.id.to_string()))
    }

    /// Queue an envelope for the client without waiting.
    ///
    /// When the outbound channel is full the envelope is dropped and counted.
    pub fn offer_outbound(&self, envelope: Envelope) -> bool {
        match self.outbound_tx.try_send(envelope) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped_outbound.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(session_id = %self.id, dropped, "outbound channel full, dropping envelope");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Envelopes dropped because the outbound channel was full.
    pub fn dropped_outbound(&self) -> usize {
        self.dropped_outbound.load(Ordering::Relaxed)
    }

    /// Envelopes currently queued in both directions.
    pub fn pending(&self) -> usize {
        let queued = |tx: &mpsc::Sender<Envelope>| tx.max_capacity() - tx.capacity();
        queued(&self.inbound_tx) + queued(&self.outbound_tx)
    }

    /// Hand the inbound receiver to the chat-send task.
    pub async fn take_inbound(&self) -> Option<mpsc::Receiver<Envelope>> {
        self.inbound_rx.lock().await.take()
    }

    /// Put the inbound receiver back once the chat-send task has stopped, so
    /// envelopes still queued are counted by [`Session::pending`].
    pub async fn return_inbound(&self, rx: mpsc::Receiver<Envelope>) {
        *self.inbound_rx.lock().await = Some(rx);
    }

    /// Hand the outbound receiver to a transport attachment.
    pub async fn take_outbound(&self) -> Result<mpsc::Receiver<Envelope>, BridgeError> {
        let mut slot = self.outbound_rx.lock().await;
        let rx = slot
            .take()
            .ok_or_else(|| BridgeError::AlreadyAttached(self.id.to_string()))?;
        self.attached.store(true, Ordering::Release);
        self.touch();
        Ok(rx)
    }

    /// Return the outbound receiver when a transport detaches.
    pub async fn return_outbound(&self, rx: mpsc::Receiver<Envelope>) {
        *self.outbound_rx.lock().await = Some(rx);
        self.attached.store(false, Ordering::Release);
        self.touch();
    }

    /// Record client activity.
    pub fn touch(&self) {
        let elapsed = self.created_at.elapsed().as_millis() as u64;
        self.last_activity_ms.fetch_max(elapsed, Ordering::Relaxed);
    }

    /// Time since the last client activity.
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_activity_ms.load(Ordering::Relaxed));
        self.created_at.elapsed().saturating_sub(last)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(capacity: usize) -> Session {
        Session::new(SessionId::new("s1"), capacity, "bridge@example.org")
    }

    #[tokio::test]
    async fn inbound_is_fifo() {
        let s = session(8);
        for i in 0..5 {
            s.push_inbound(Envelope::control(format!("a{i}"))).await.unwrap();
        }
        let mut rx = s.take_inbound().await.unwrap();
        for i in 0..5 {
            assert_eq!(rx.recv().await.unwrap(), Envelope::control(format!("a{i}")));
        }
        assert!(s.take_inbound().await.is_none());
    }

    #[tokio::test]
    async fn returned_inbound_keeps_queued_envelopes_counted() {
        let s = session(8);
        let rx = s.take_inbound().await.unwrap();
        s.push_inbound(Envelope::control("a")).await.unwrap();
        s.push_inbound(Envelope::control("b")).await.unwrap();

        s.return_inbound(rx).await;
        assert_eq!(s.pending(), 2);
        assert!(s.take_inbound().await.is_some());
    }

    #[tokio::test]
    async fn outbound_drops_newest_when_full() {
        let s = session(2);
        assert!(s.offer_outbound(Envelope::control("1")));
        assert!(s.offer_outbound(Envelope::control("2")));
        assert!(!s.offer_outbound(Envelope::control("3")));
        assert_eq!(s.dropped_outbound(), 1);
        assert_eq!(s.pending(), 2);

        let mut rx = s.take_outbound().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Envelope::control("1"));
        assert_eq!(rx.recv().await.unwrap(), Envelope::control("2"));
    }

    #[tokio::test]
    async fn outbound_receiver_has_one_holder() {
        let s = session(4);
        let rx = s.take_outbound().await.unwrap();
        assert!(s.is_attached());
        assert!(matches!(
            s.take_outbound().await,
            Err(BridgeError::AlreadyAttached(_))
        ));

        s.return_outbound(rx).await;
        assert!(!s.is_attached());
        assert!(s.take_outbound().await.is_ok());
    }

    #[test]
    fn terminal_state_is_sticky() {
        let s = session(1);
        assert_eq!(s.state(), SessionState::Created);
        assert!(s.set_state(SessionState::Connecting));
        assert!(!s.set_state(SessionState::Connecting));
        assert!(s.set_state(SessionState::Failed));
        assert!(!s.set_state(SessionState::Closed));
        assert_eq!(s.state(), SessionState::Failed);
    }

    #[test]
    fn bound_identity_starts_as_configured() {
        let s = session(1);
        assert_eq!(s.bound_identity(), "bridge@example.org");
        s.set_bound_identity("bridge@example.org/abc");
        assert_eq!(s.bound_identity(), "bridge@example.org/abc");
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_resets_on_touch() {
        let s = session(1);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(s.idle_for() >= Duration::from_secs(30));

        s.touch();
        assert!(s.idle_for() < Duration::from_secs(1));
    }
}

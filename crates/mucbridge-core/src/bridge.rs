//! Connection bootstrap and session lifecycle.
//!
//! [`Bridge`] ties the registry, the chat connector and the relay pumps
//! together:
//!
//! - [`Bridge::create_session`] registers a session, starts its chat
//!   connection and spawns its chat-send task.
//! - [`Bridge::attach`] runs the transport pumps for an attached client.
//! - [`Bridge::close`] and [`Bridge::evict_idle`] tear sessions down.
//!
//! A failure on the chat side of one session marks that session `Failed`,
//! publishes `BridgeEvent::SessionFailed` and closes it. Other sessions and
//! the process are unaffected.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream};
use mucbridge_types::config::{RoomSection, SessionSection};
use mucbridge_types::envelope::{ControlPayload, Envelope};
use mucbridge_types::error::BridgeError;
use mucbridge_types::event::BridgeEvent;
use mucbridge_types::session::{SessionId, SessionState};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::chat::{ChatConnector, DynChatLink};
use crate::event::EventBus;
use crate::relay::chat_send::{self, RoomTarget};
use crate::relay::pump::{self, PumpExit};
use crate::session::{Session, SessionRegistry};

/// Capacity of the lifecycle event bus.
const EVENT_BUS_CAPACITY: usize = 1024;

pub struct Bridge<C: ChatConnector> {
    connector: C,
    registry: Arc<SessionRegistry>,
    events: EventBus,
    room: RoomTarget,
}

impl<C: ChatConnector + 'static> Bridge<C> {
    pub fn new(connector: C, room: &RoomSection, session: &SessionSection) -> Self {
        Self {
            connector,
            registry: Arc::new(SessionRegistry::new(session.channel_capacity)),
            events: EventBus::new(EVENT_BUS_CAPACITY),
            room: RoomTarget {
                address: room.address.clone(),
                nickname_prefix: room.nickname_prefix.clone(),
            },
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Create a session and start its chat connection.
    ///
    /// Returns as soon as the connection is constructed; the room is joined
    /// when the connection reports that it is online. If the connection
    /// cannot be constructed the session is failed and removed.
    pub async fn create_session(&self) -> Result<SessionId, BridgeError> {
        let (id, session) = self.registry.create(self.connector.identity());
        self.events.publish(BridgeEvent::SessionCreated {
            session_id: id.clone(),
        });

        session.set_state(SessionState::Connecting);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let handler = chat_send::event_handler(Arc::downgrade(&session), signal_tx);

        let link = match self.connector.connect(handler).await {
            Ok(link) => DynChatLink::new(link),
            Err(err) => {
                fail_session(&self.registry, &self.events, &session, err.to_string()).await;
                return Err(err.into());
            }
        };
        session.set_chat_link(link.clone());

        let Some(mut inbound) = session.take_inbound().await else {
            return Err(BridgeError::SessionClosed(id.to_string()));
        };

        let registry = self.registry.clone();
        let events = self.events.clone();
        let room = self.room.clone();
        let task_session = session.clone();
        tokio::spawn(async move {
            let result =
                chat_send::run_chat_send(task_session.clone(), link, &mut inbound, signal_rx, room)
                    .await;
            task_session.return_inbound(inbound).await;
            match result {
                // A send cut short by teardown is not a session failure.
                Err(_) if task_session.cancellation().is_cancelled() => {}
                Err(err) => {
                    fail_session(&registry, &events, &task_session, err.to_string()).await;
                }
                Ok(()) => {}
            }
        });

        info!(session_id = %id, "session created");
        Ok(id)
    }

    /// Attach a client transport to a session and relay until it detaches.
    ///
    /// `frames` yields the client's text frames; `sink` accepts frames for
    /// the client. Only one transport may be attached at a time; after it
    /// detaches the same id can be attached again.
    pub async fn attach<S, E, K>(
        &self,
        id: &str,
        frames: S,
        mut sink: K,
    ) -> Result<PumpExit, BridgeError>
    where
        S: Stream<Item = Result<String, E>> + Unpin,
        E: Display,
        K: Sink<String> + Unpin,
        K::Error: Display,
    {
        let session = self.registry.lookup(id)?;
        if session.state().is_terminal() {
            return Err(BridgeError::SessionClosed(id.to_string()));
        }
        let mut outbound = session.take_outbound().await?;

        info!(session_id = %id, "transport attached");
        self.events.publish(BridgeEvent::SessionAttached {
            session_id: session.id().clone(),
        });

        let cancel = session.cancellation().clone();
        let exit = {
            let inbound_pump = pump::run_inbound(&session, frames);
            let outbound_pump = pump::run_outbound(&session, &mut outbound, &mut sink);
            tokio::select! {
                _ = cancel.cancelled() => PumpExit::Cancelled,
                exit = inbound_pump => exit,
                exit = outbound_pump => exit,
            }
        };
        session.return_outbound(outbound).await;

        if session.state() == SessionState::Failed {
            notify_failed(&mut sink).await;
        }

        info!(session_id = %id, ?exit, "transport detached");
        self.events.publish(BridgeEvent::SessionDetached {
            session_id: session.id().clone(),
        });
        Ok(exit)
    }

    /// Close a session: cancel its pumps, close its chat connection and
    /// remove it. Queued envelopes are discarded; the count is returned.
    pub async fn close(&self, id: &str) -> Result<usize, BridgeError> {
        let session = self
            .registry
            .remove(id)
            .ok_or_else(|| BridgeError::SessionNotFound(id.to_string()))?;
        Ok(teardown(&self.events, &session).await)
    }

    /// Close every unattached session idle for longer than `max_idle`.
    pub async fn evict_idle(&self, max_idle: Duration) -> Vec<SessionId> {
        let mut evicted = Vec::new();
        for id in self.registry.idle_sessions(max_idle) {
            if self.close(id.as_str()).await.is_ok() {
                info!(session_id = %id, "idle session evicted");
                evicted.push(id);
            }
        }
        evicted
    }

    /// Close every session, e.g. on shutdown.
    pub async fn close_all(&self) -> usize {
        let ids = self.registry.ids();
        let count = ids.len();
        for id in ids {
            let _ = self.close(id.as_str()).await;
        }
        count
    }
}

async fn fail_session(
    registry: &SessionRegistry,
    events: &EventBus,
    session: &Arc<Session>,
    reason: String,
) {
    error!(session_id = %session.id(), %reason, "session failed");
    session.set_state(SessionState::Failed);
    events.publish(BridgeEvent::SessionFailed {
        session_id: session.id().clone(),
        reason,
    });
    if registry.remove(session.id().as_str()).is_some() {
        teardown(events, session).await;
    }
}

async fn teardown(events: &EventBus, session: &Session) -> usize {
    // Counted before cancelling; the pumps release queued envelopes as they stop.
    let discarded = session.pending();

    session.set_state(SessionState::Closed);
    session.cancellation().cancel();
    if let Some(link) = session.chat_link() {
        link.close().await;
    }

    if discarded > 0 {
        warn!(session_id = %session.id(), discarded, "discarding queued envelopes");
    }
    info!(session_id = %session.id(), state = %session.state(), "session closed");
    events.publish(BridgeEvent::SessionClosed {
        session_id: session.id().clone(),
        discarded,
    });
    discarded
}

async fn notify_failed<K>(sink: &mut K)
where
    K: Sink<String> + Unpin,
    K::Error: Display,
{
    let Ok(frame) = Envelope::control(ControlPayload::SESSION_FAILED).encode() else {
        return;
    };
    if let Err(err) = sink.send(frame).await {
        warn!(error = %err, "could not notify client of session failure");
    }
}

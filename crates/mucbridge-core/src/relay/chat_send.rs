//! The chat side of a session.
//!
//! [`event_handler`] turns chat events into outbound envelopes and lifecycle
//! signals; [`run_chat_send`] consumes those signals together with the
//! inbound channel, joins the room whenever the connection comes online, and
//! dispatches client messages to the chat connection one at a time.

use std::sync::{Arc, Weak};

use mucbridge_types::chat::ChatEvent;
use mucbridge_types::envelope::Envelope;
use mucbridge_types::error::ChatError;
use mucbridge_types::session::SessionState;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chat::{ChatEventHandler, DynChatLink};
use crate::session::Session;
use crate::translate;

/// Connection lifecycle changes forwarded from the handler to the chat-send task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSignal {
    Online { bound_identity: String },
    Disconnected { reason: String },
}

/// Where sessions join.
#[derive(Debug, Clone)]
pub struct RoomTarget {
    pub address: String,
    pub nickname_prefix: String,
}

/// Build the handler registered with a session's chat connection.
///
/// Messages are translated and offered to the outbound channel; lifecycle
/// events go to `signals`. Nothing here waits, so the handler is safe to run
/// on the chat connection's task. The session is held weakly so a closed
/// session is not kept alive by its connection.
pub fn event_handler(
    session: Weak<Session>,
    signals: mpsc::UnboundedSender<LinkSignal>,
) -> ChatEventHandler {
    ChatEventHandler::new(move |event| {
        let Some(session) = session.upgrade() else {
            return;
        };

        match &event {
            ChatEvent::Online { bound_identity } => {
                let _ = signals.send(LinkSignal::Online {
                    bound_identity: bound_identity.clone(),
                });
            }
            ChatEvent::Disconnected { reason } => {
                let _ = signals.send(LinkSignal::Disconnected {
                    reason: reason.clone(),
                });
            }
            ChatEvent::Message(_) => {
                if let Some(envelope) =
                    translate::from_chat_event(&event, &session.bound_identity())
                {
                    session.offer_outbound(envelope);
                }
            }
            ChatEvent::Presence { .. } | ChatEvent::Error { .. } => {
                debug!(session_id = %session.id(), event = event.name(), "chat event not forwarded");
            }
        }
    })
}

/// Run the chat side of a session until it is cancelled or fails.
///
/// Client messages are read from `inbound` only while the session is
/// `Active`, so nothing reaches the room before the join. A message the
/// connection refuses because it went offline is held and sent first after
/// the next join. The receiver is borrowed so whatever is still queued when
/// the task ends stays countable.
///
/// Returns an error only for failures that end the session: a room join or
/// message send the chat connection refused.
pub async fn run_chat_send(
    session: Arc<Session>,
    link: DynChatLink,
    inbound: &mut mpsc::Receiver<Envelope>,
    mut signals: mpsc::UnboundedReceiver<LinkSignal>,
    room: RoomTarget,
) -> Result<(), ChatError> {
    let cancel = session.cancellation().clone();
    let mut held: Option<Envelope> = None;

    loop {
        let active = session.state() == SessionState::Active;

        tokio::select! {
            biased;

            _ = cancel.cancelled() => return Ok(()),

            Some(signal) = signals.recv() => match signal {
                LinkSignal::Online { bound_identity } => {
                    session.set_bound_identity(bound_identity.clone());
                    let join = translate::room_join(
                        &room.address,
                        &room.nickname_prefix,
                        &bound_identity,
                    );
                    info!(
                        session_id = %session.id(),
                        room = %room.address,
                        nickname = %join.nickname(),
                        "joining room"
                    );
                    match link.join_room(join).await {
                        Ok(()) => {}
                        Err(ChatError::NotConnected) => {
                            debug!(session_id = %session.id(), "connection lost before join");
                            session.set_state(SessionState::Connecting);
                            continue;
                        }
                        Err(err) => return Err(err),
                    }
                    session.set_state(SessionState::JoinedRoom);
                    session.set_state(SessionState::Active);

                    if let Some(envelope) = held.take() {
                        held = send_or_hold(&session, &link, envelope).await?;
                    }
                }
                LinkSignal::Disconnected { reason } => {
                    warn!(session_id = %session.id(), %reason, "chat connection lost, reconnecting");
                    session.set_state(SessionState::Connecting);
                }
            },

            envelope = inbound.recv(), if active => {
                let Some(envelope) = envelope else {
                    return Ok(());
                };
                held = send_or_hold(&session, &link, envelope).await?;
            }
        }
    }
}

/// Dispatch one envelope. Returns it back when the connection is offline.
async fn send_or_hold(
    session: &Session,
    link: &DynChatLink,
    envelope: Envelope,
) -> Result<Option<Envelope>, ChatError> {
    match dispatch(session, link, &envelope).await {
        Err(ChatError::NotConnected) => {
            debug!(session_id = %session.id(), "connection offline, holding message until rejoin");
            session.set_state(SessionState::Connecting);
            Ok(Some(envelope))
        }
        result => result.map(|()| None),
    }
}

async fn dispatch(session: &Session, link: &DynChatLink, envelope: &Envelope) -> Result<(), ChatError> {
    match envelope {
        Envelope::Control(ctrl) => {
            debug!(session_id = %session.id(), action = %ctrl.action, "control envelope ignored");
            Ok(())
        }
        Envelope::Chat(payload) => {
            match translate::to_chat_send(payload, &session.bound_identity()) {
                Ok(send) => {
                    debug!(session_id = %session.id(), to = %send.to, id = %send.id, "sending chat message");
                    match link.send_message(send).await {
                        Err(ChatError::InvalidAddress { address, reason }) => {
                            warn!(session_id = %session.id(), %address, %reason, "dropping message to invalid address");
                            Ok(())
                        }
                        result => result,
                    }
                }
                Err(err) => {
                    warn!(session_id = %session.id(), error = %err, "dropping untranslatable envelope");
                    Ok(())
                }
            }
        }
    }
}

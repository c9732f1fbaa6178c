//! Transport-facing pumps.
//!
//! Both pumps are generic over a stream of text frames and a sink of text
//! frames, so they run the same way over an axum WebSocket and over an
//! in-memory stream in tests.

use std::fmt::Display;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use mucbridge_types::envelope::Envelope;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::session::Session;

/// Why a pump (and with it the attachment) stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpExit {
    /// The client closed the stream.
    EndOfStream,
    /// Reading from or writing to the transport failed.
    TransportError(String),
    /// The session was torn down.
    Cancelled,
}

/// Decode frames from the transport into the session's inbound channel.
///
/// A frame that does not decode is logged and skipped. The pump ends when
/// the stream ends, a read fails, or the session stops accepting envelopes.
pub async fn run_inbound<S, E>(session: &Session, mut frames: S) -> PumpExit
where
    S: Stream<Item = Result<String, E>> + Unpin,
    E: Display,
{
    while let Some(frame) = frames.next().await {
        let text = match frame {
            Ok(text) => text,
            Err(err) => {
                warn!(session_id = %session.id(), error = %err, "transport read failed");
                return PumpExit::TransportError(err.to_string());
            }
        };

        session.touch();
        let envelope = match Envelope::decode(&text) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(session_id = %session.id(), error = %err, "ignoring malformed envelope");
                continue;
            }
        };

        debug!(session_id = %session.id(), kind = ?envelope.kind(), "envelope received");
        if session.push_inbound(envelope).await.is_err() {
            return PumpExit::Cancelled;
        }
    }

    PumpExit::EndOfStream
}

/// Write envelopes from the session's outbound channel to the transport.
pub async fn run_outbound<K>(
    session: &Session,
    outbound: &mut mpsc::Receiver<Envelope>,
    sink: &mut K,
) -> PumpExit
where
    K: Sink<String> + Unpin,
    K::Error: Display,
{
    while let Some(envelope) = outbound.recv().await {
        let text = match envelope.encode() {
            Ok(text) => text,
            Err(err) => {
                warn!(session_id = %session.id(), error = %err, "failed to encode envelope");
                continue;
            }
        };

        if let Err(err) = sink.send(text).await {
            warn!(session_id = %session.id(), error = %err, "transport write failed");
            return PumpExit::TransportError(err.to_string());
        }
        session.touch();
    }

    PumpExit::Cancelled
}

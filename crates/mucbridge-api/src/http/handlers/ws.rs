//! WebSocket attachment to a session.
//!
//! `GET /ws/{id}` upgrades the connection and relays envelopes between the
//! socket and the session until either side ends. The id is checked before
//! the upgrade headers: unknown ids get 404 and a session that already has a
//! socket gets 409, whether or not the request could be upgraded.
//!
//! Only text frames carry envelopes; binary frames are logged and skipped.
//! Pings are answered by axum and a close frame ends the attachment. The
//! session itself survives a disconnect and can be attached again.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt, future};
use mucbridge_core::chat::ChatConnector;
use mucbridge_types::error::BridgeError;

use crate::http::error::AppError;
use crate::state::AppState;

pub async fn ws_handler<C: ChatConnector + 'static>(
    Path(id): Path<String>,
    State(state): State<AppState<C>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let session = state.bridge.registry().lookup(&id)?;
    if session.is_attached() {
        return Err(BridgeError::AlreadyAttached(id).into());
    }
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, id, state))
        .into_response())
}

async fn handle_socket<C: ChatConnector + 'static>(socket: WebSocket, id: String, state: AppState<C>) {
    let (sender, receiver) = socket.split();

    let session_id = id.clone();
    let frames = Box::pin(
        receiver
            .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(move |msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                    Ok(Message::Binary(data)) => {
                        tracing::debug!(session_id = %session_id, len = data.len(), "skipping binary frame");
                        None
                    }
                    Ok(_) => None,
                    Err(err) => Some(Err(err)),
                })
            }),
    );
    let sink = sender.with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text.into()))));

    match state.bridge.attach(&id, frames, sink).await {
        Ok(exit) => tracing::debug!(session_id = %id, ?exit, "websocket closed"),
        // Lost the race against another socket or a close after the pre-upgrade check.
        Err(err) => tracing::warn!(session_id = %id, error = %err, "websocket attach rejected"),
    }
}

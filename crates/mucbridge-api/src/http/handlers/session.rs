//! Session bootstrap and teardown.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use mucbridge_core::chat::ChatConnector;

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /newConnection
///
/// Creates a session, starts its chat connection and returns the session id
/// as plain text. The client then attaches with `GET /ws/{id}`.
pub async fn new_connection<C: ChatConnector + 'static>(
    State(state): State<AppState<C>>,
) -> Result<String, AppError> {
    let id = state.bridge.create_session().await?;
    Ok(id.to_string())
}

/// DELETE /connection/{id}
pub async fn close_connection<C: ChatConnector + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let discarded = state.bridge.close(&id).await?;
    tracing::info!(session_id = %id, discarded, "session closed by request");
    Ok(StatusCode::NO_CONTENT)
}

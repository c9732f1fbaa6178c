use thiserror::Error;

use crate::envelope::EnvelopeError;

/// Errors surfaced by bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session {0} already has a transport attached")]
    AlreadyAttached(String),

    #[error("session {0} is closed")]
    SessionClosed(String),

    #[error(transparent)]
    MalformedEnvelope(#[from] EnvelopeError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("transport I/O error: {0}")]
    TransportIo(String),

    #[error(transparent)]
    ChatProtocol(#[from] ChatError),
}

/// A payload is missing a field the chat protocol needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("invalid payload: {0} is required")]
    InvalidPayload(&'static str),
}

/// Errors from the chat-protocol connection.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("send failed: {0}")]
    Send(String),

    /// The connection is between streams; the stanza was not sent.
    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    Closed,
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

//! Session registry and bidirectional relay engine for mucbridge.
//!
//! This crate defines the chat-connection "ports" ([`chat::ChatConnector`],
//! [`chat::ChatLink`]) that the infrastructure layer implements, and the
//! engine that relays envelopes between a WebSocket attachment and a chat
//! connection. It depends only on `mucbridge-types` -- never on
//! `mucbridge-infra`, axum, or any XMPP crate.

pub mod bridge;
pub mod chat;
pub mod event;
pub mod id;
pub mod relay;
pub mod session;
pub mod translate;

pub use bridge::Bridge;

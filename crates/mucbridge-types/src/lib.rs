//! Shared domain types for mucbridge.
//!
//! This crate contains the types shared by every layer of the bridge: the
//! WebSocket wire envelope, the protocol-neutral chat model, configuration
//! structs, session lifecycle events, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod chat;
pub mod config;
pub mod envelope;
pub mod error;
pub mod event;
pub mod session;

//! Infrastructure layer for mucbridge.
//!
//! Contains the `tokio-xmpp` implementation of the chat ports defined in
//! `mucbridge-core` and the configuration file loader.

pub mod config;
pub mod xmpp;

//! Chat-protocol ports.
//!
//! The relay engine talks to the chat server only through these traits; the
//! XMPP implementation lives in `mucbridge-infra`.

pub mod dyn_link;
pub mod handler;
pub mod link;

pub use dyn_link::DynChatLink;
pub use handler::ChatEventHandler;
pub use link::{ChatConnector, ChatLink};

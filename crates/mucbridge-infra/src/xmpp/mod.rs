//! XMPP chat connection.
//!
//! - [`connector`]: `XmppConnector` / `XmppLink`, the `tokio-xmpp` client per session
//! - [`stanza`]: chat model <-> stanza conversion

pub mod connector;
pub mod stanza;

pub use connector::{ServerTarget, XmppConnector, XmppLink};

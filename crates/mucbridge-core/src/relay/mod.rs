//! Relay engine: the pumps that move envelopes across a session.
//!
//! - [`pump::run_inbound`]: transport frames -> `Session.inbound`
//! - [`chat_send::run_chat_send`]: `Session.inbound` -> chat connection
//! - [`pump::run_outbound`]: `Session.outbound` -> transport frames
//!
//! Chat events reach `Session.outbound` through the handler built by
//! [`chat_send::event_handler`].

pub mod chat_send;
pub mod pump;

pub use pump::PumpExit;

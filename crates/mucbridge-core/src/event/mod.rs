//! Event bus for session lifecycle events.

pub mod bus;

pub use bus::EventBus;

//! HTTP and WebSocket surface: connection bootstrap, the relay socket and
//! health.

pub mod error;
pub mod handlers;
pub mod router;

#[cfg(test)]
pub mod test_support;

//! Observability setup for mucbridge: the global `tracing` subscriber and
//! optional OpenTelemetry span export.

pub mod tracing_setup;

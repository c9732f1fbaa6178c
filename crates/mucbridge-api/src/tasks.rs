//! Background tasks run alongside the server.

use std::sync::Arc;
use std::time::Duration;

use mucbridge_core::Bridge;
use mucbridge_core::chat::ChatConnector;
use mucbridge_types::config::SessionSection;
use mucbridge_types::event::BridgeEvent;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Log every lifecycle event published by the bridge.
pub fn spawn_event_log(mut events: broadcast::Receiver<BridgeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event @ BridgeEvent::SessionFailed { .. }) => {
                    tracing::warn!(event = ?event, "session event");
                }
                Ok(event) => tracing::debug!(event = ?event, "session event"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event log lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Periodically close sessions nobody has attached to for `idle_timeout_secs`.
pub fn spawn_idle_sweeper<C: ChatConnector + 'static>(
    bridge: Arc<Bridge<C>>,
    session: &SessionSection,
) -> JoinHandle<()> {
    let max_idle = Duration::from_secs(session.idle_timeout_secs);
    let every = Duration::from_secs(session.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = bridge.evict_idle(max_idle).await;
            if !evicted.is_empty() {
                tracing::info!(count = evicted.len(), "evicted idle sessions");
            }
        }
    })
}

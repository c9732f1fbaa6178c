//! Shared application state for the HTTP handlers.

use std::sync::Arc;

use mucbridge_core::Bridge;
use mucbridge_core::chat::ChatConnector;
use mucbridge_infra::xmpp::XmppConnector;
use mucbridge_types::config::BridgeConfig;

/// State handed to every handler. Generic over the chat connector so the
/// router can be exercised without an XMPP server.
pub struct AppState<C: ChatConnector = XmppConnector> {
    pub bridge: Arc<Bridge<C>>,
    pub config: Arc<BridgeConfig>,
}

impl<C: ChatConnector + 'static> AppState<C> {
    pub fn new(connector: C, config: BridgeConfig) -> Self {
        let bridge = Bridge::new(connector, &config.room, &config.session);
        Self {
            bridge: Arc::new(bridge),
            config: Arc::new(config),
        }
    }
}

impl<C: ChatConnector> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            config: self.config.clone(),
        }
    }
}

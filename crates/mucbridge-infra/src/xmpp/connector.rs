//! `tokio-xmpp` implementation of [`ChatConnector`] / [`ChatLink`].
//!
//! Each [`XmppConnector::connect`] call spawns a driver task that owns the
//! client stream. The driver is the only place the client is touched: it
//! forwards client events to the session's [`ChatEventHandler`] and executes
//! commands sent by the [`XmppLink`].
//!
//! The client's own reconnect loop is disabled. When a stream ends the driver
//! drops the client and builds a new one after an exponential [`Backoff`],
//! reporting one `Disconnected` per outage. Between streams sends are refused
//! with [`ChatError::NotConnected`] and a close skips the stream end.

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use mucbridge_core::chat::{ChatConnector, ChatEventHandler, ChatLink};
use mucbridge_types::chat::{ChatEvent, ChatSend, RoomJoin};
use mucbridge_types::config::XmppSection;
use mucbridge_types::error::ChatError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_xmpp::parsers::{Element, Jid};
use tokio_xmpp::{AsyncClient, AsyncConfig, AsyncServerConfig, Event};
use tracing::{debug, info, warn};

use super::stanza;

/// Pending commands per connection.
const COMMAND_BUFFER: usize = 64;

/// Upper bound on sending `</stream:stream>` when closing.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the client connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTarget {
    /// Resolve via DNS SRV on the JID's domain.
    Srv,
    Manual { host: String, port: u16 },
}

impl ServerTarget {
    /// Parse a `host:port` address. An empty address means SRV lookup.
    pub fn parse(address: &str) -> Result<Self, ChatError> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(ServerTarget::Srv);
        }
        let invalid = |reason: &str| ChatError::InvalidAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        };
        let (host, port) = address.rsplit_once(':').ok_or_else(|| invalid("expected host:port"))?;
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
        Ok(ServerTarget::Manual {
            host: host.to_string(),
            port,
        })
    }

    fn server_config(&self) -> AsyncServerConfig {
        match self {
            ServerTarget::Srv => AsyncServerConfig::UseSrv,
            ServerTarget::Manual { host, port } => AsyncServerConfig::Manual {
                host: host.clone(),
                port: *port,
            },
        }
    }
}

/// Delay between reconnect attempts: starts at `initial`, doubles after
/// every failed attempt, capped at `max`. Reset once a stream comes online.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
        }
    }
}

impl Backoff {
    fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

/// Opens one XMPP client stream per session, all with the same credentials.
#[derive(Debug, Clone)]
pub struct XmppConnector {
    jid: String,
    password: String,
    server: ServerTarget,
    backoff: Backoff,
}

impl XmppConnector {
    /// Build a connector from the `[xmpp]` section.
    ///
    /// A `jid` without a domain part is completed with `domain`.
    pub fn from_config(xmpp: &XmppSection) -> Result<Self, ChatError> {
        let jid = if xmpp.jid.contains('@') || xmpp.domain.is_empty() {
            xmpp.jid.clone()
        } else {
            format!("{}@{}", xmpp.jid, xmpp.domain)
        };
        if stanza::parse_jid(&jid)?.node_str().is_none() {
            return Err(ChatError::InvalidAddress {
                address: jid,
                reason: "missing user part".to_string(),
            });
        }

        Ok(Self {
            jid,
            password: xmpp.password.clone(),
            server: ServerTarget::parse(&xmpp.address)?,
            backoff: Backoff::default(),
        })
    }

    /// Replace the reconnect backoff.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

impl ChatConnector for XmppConnector {
    type Link = XmppLink;

    fn identity(&self) -> &str {
        &self.jid
    }

    async fn connect(&self, handler: ChatEventHandler) -> Result<XmppLink, ChatError> {
        let settings = ClientSettings {
            jid: stanza::parse_jid(&self.jid)?,
            password: self.password.clone(),
            server: self.server.clone(),
        };
        let (commands_tx, commands) = mpsc::channel::<Command>(COMMAND_BUFFER);

        tokio::spawn(drive(settings, self.backoff, handler, commands));

        Ok(XmppLink {
            commands: commands_tx,
        })
    }
}

struct ClientSettings {
    jid: Jid,
    password: String,
    server: ServerTarget,
}

impl ClientSettings {
    /// Start a client that ends its stream instead of reconnecting.
    fn client(&self) -> AsyncClient {
        let mut client = AsyncClient::new_with_config(AsyncConfig {
            jid: self.jid.clone(),
            password: self.password.clone(),
            server: self.server.server_config(),
        });
        client.set_reconnect(false);
        client
    }
}

/// Next event of the current stream; never resolves between streams.
async fn next_event<S>(client: &mut Option<S>) -> Option<Event>
where
    S: Stream<Item = Event> + Unpin,
{
    match client {
        Some(client) => client.next().await,
        None => std::future::pending().await,
    }
}

async fn drive(
    settings: ClientSettings,
    backoff: Backoff,
    handler: ChatEventHandler,
    mut commands: mpsc::Receiver<Command>,
) {
    let jid = settings.jid.to_string();
    debug!(%jid, "xmpp driver started");

    let mut client = Some(settings.client());
    let mut delay = backoff.initial;
    let mut outage_reported = false;
    let retry = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(retry);

    loop {
        // Only a bound stream accepts writes; the client's sink never wakes
        // while it is still connecting.
        let online = client.as_ref().is_some_and(|c| c.bound_jid().is_some());

        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send { stanza, reply }) => {
                    let result = match client.as_mut() {
                        Some(client) if online => client
                            .send_stanza(stanza)
                            .await
                            .map_err(|e| ChatError::Send(e.to_string())),
                        _ => Err(ChatError::NotConnected),
                    };
                    let _ = reply.send(result);
                }
                Some(Command::Close) | None => {
                    if let Some(client) = client.as_mut().filter(|_| online) {
                        match tokio::time::timeout(CLOSE_TIMEOUT, client.send_end()).await {
                            Ok(Ok(())) => {}
                            Ok(Err(err)) => debug!(%jid, error = %err, "closing xmpp stream"),
                            Err(_) => debug!(%jid, "timed out closing xmpp stream"),
                        }
                    }
                    break;
                }
            },

            event = next_event(&mut client) => {
                let reason = match event {
                    Some(Event::Online { bound_jid, resumed }) => {
                        info!(%jid, bound = %bound_jid, resumed, "xmpp online");
                        delay = backoff.initial;
                        outage_reported = false;
                        handler.dispatch(ChatEvent::Online {
                            bound_identity: bound_jid.to_string(),
                        });
                        continue;
                    }
                    Some(Event::Stanza(element)) => {
                        if let Some(event) = stanza::chat_event(element) {
                            handler.dispatch(event);
                        }
                        continue;
                    }
                    Some(Event::Disconnected(err)) => err.to_string(),
                    None => "stream ended".to_string(),
                };

                client = None;
                retry.as_mut().reset(Instant::now() + delay);
                debug!(%jid, %reason, retry_in = ?delay, "xmpp stream down");
                delay = backoff.next(delay);

                if !outage_reported {
                    outage_reported = true;
                    warn!(%jid, %reason, "xmpp disconnected");
                    handler.dispatch(ChatEvent::Disconnected { reason });
                }
            },

            _ = &mut retry, if client.is_none() => {
                debug!(%jid, "xmpp reconnecting");
                client = Some(settings.client());
            },
        }
    }
    debug!(%jid, "xmpp driver stopped");
}

enum Command {
    Send {
        stanza: Element,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    Close,
}

/// Handle to one connection's driver task.
///
/// Once the driver has stopped every send fails with [`ChatError::Closed`].
pub struct XmppLink {
    commands: mpsc::Sender<Command>,
}

impl XmppLink {
    async fn send(&self, stanza: Element) -> Result<(), ChatError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Send { stanza, reply })
            .await
            .map_err(|_| ChatError::Closed)?;
        response.await.map_err(|_| ChatError::Closed)?
    }
}

impl ChatLink for XmppLink {
    async fn send_message(&self, message: ChatSend) -> Result<(), ChatError> {
        self.send(stanza::group_message(&message)?).await
    }

    async fn join_room(&self, join: RoomJoin) -> Result<(), ChatError> {
        self.send(stanza::join_presence(&join)?).await
    }

    /// Ask the driver to stop and wait until it has.
    async fn close(&self) {
        if self.commands.send(Command::Close).await.is_ok() {
            self.commands.closed().await;
        }
    }
}

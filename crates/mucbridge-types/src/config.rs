//! Configuration types for mucbridge.
//!
//! `BridgeConfig` represents the `mucbridge.toml` file. Every section has
//! defaults except the XMPP credentials, which [`BridgeConfig::validate`]
//! requires before a server is started.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub xmpp: XmppSection,
    #[serde(default)]
    pub room: RoomSection,
    #[serde(default)]
    pub session: SessionSection,
}

/// `[server]`: where the HTTP/WebSocket listener binds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[xmpp]`: process-wide chat credentials shared by every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmppSection {
    /// `host:port` of the XMPP server. Empty means SRV lookup on the JID domain.
    #[serde(default = "default_xmpp_address")]
    pub address: String,
    /// Server name of the XMPP service (may differ from the address host).
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub jid: String,
    #[serde(default)]
    pub password: String,
}

impl Default for XmppSection {
    fn default() -> Self {
        Self {
            address: default_xmpp_address(),
            domain: String::new(),
            jid: String::new(),
            password: String::new(),
        }
    }
}

/// `[room]`: the shared multi-user chat every session joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSection {
    #[serde(default = "default_room_address")]
    pub address: String,
    /// Occupant nicknames are `{nickname_prefix}-{stanza id}`.
    #[serde(default = "default_nickname_prefix")]
    pub nickname_prefix: String,
}

impl Default for RoomSection {
    fn default() -> Self {
        Self {
            address: default_room_address(),
            nickname_prefix: default_nickname_prefix(),
        }
    }
}

/// `[session]`: per-session resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSection {
    /// Capacity of each directional channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Unattached sessions idle for longer than this are closed.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// How often the idle sweep runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_xmpp_address() -> String {
    "localhost:5432".to_string()
}
fn default_room_address() -> String {
    "super-test-channel@conference.fem-net.de".to_string()
}
fn default_nickname_prefix() -> String {
    "bot".to_string()
}
fn default_channel_capacity() -> usize {
    256
}
fn default_idle_timeout_secs() -> u64 {
    3600
}
fn default_sweep_interval_secs() -> u64 {
    60
}

impl BridgeConfig {
    /// Check that the required XMPP settings are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("xmpp.domain", &self.xmpp.domain),
            ("xmpp.jid", &self.xmpp.jid),
            ("xmpp.password", &self.xmpp.password),
            ("room.address", &self.room.address),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(key));
            }
        }
        if self.session.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "session.channel_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Copy with the password masked, for printing.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.xmpp.password.is_empty() {
            copy.xmpp.password = "********".to_string();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.xmpp.domain = "example.org".into();
        config.xmpp.jid = "bridge@example.org".into();
        config.xmpp.password = "secret".into();
        config
    }

    #[test]
    fn defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.xmpp.address, "localhost:5432");
        assert_eq!(config.room.nickname_prefix, "bot");
        assert_eq!(config.session.channel_capacity, 256);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: BridgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.session.idle_timeout_secs, 3600);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
[xmpp]
domain = "example.org"
jid = "bridge@example.org"
password = "pw"

[room]
address = "lobby@conference.example.org"
"#,
        )
        .unwrap();
        assert_eq!(config.xmpp.address, "localhost:5432");
        assert_eq!(config.room.address, "lobby@conference.example.org");
        assert_eq!(config.room.nickname_prefix, "bot");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_requires_credentials() {
        let err = BridgeConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("xmpp.domain")));

        let mut config = valid();
        config.xmpp.password = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("xmpp.password"))
        ));
    }

    #[test]
    fn validate_rejects_zero_capacity() {
        let mut config = valid();
        config.session.channel_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn redacted_masks_password_only() {
        let redacted = valid().redacted();
        assert_eq!(redacted.xmpp.password, "********");
        assert_eq!(redacted.xmpp.jid, "bridge@example.org");
    }
}

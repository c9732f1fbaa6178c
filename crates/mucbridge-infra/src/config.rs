//! Configuration loader for mucbridge.
//!
//! Reads `mucbridge.toml` (or the file given with `--config`) and
//! deserializes it into [`BridgeConfig`]. Values from the environment and the
//! command line are layered on top with [`ConfigOverrides`].

use std::path::Path;

use mucbridge_types::config::BridgeConfig;
use mucbridge_types::error::ConfigError;

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "mucbridge.toml";

/// Load configuration.
///
/// - With no `path`, reads [`DEFAULT_CONFIG_FILE`]; if it does not exist the
///   defaults are returned.
/// - With an explicit `path`, the file must exist.
/// - A file that exists but fails to parse is an error. Unlike soft settings,
///   the chat credentials live here, so guessing is worse than stopping.
pub async fn load_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let (config_path, explicit) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };

    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
            tracing::debug!("No {} found, using defaults", config_path.display());
            return Ok(BridgeConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: config_path.display().to_string(),
                reason: err.to_string(),
            });
        }
    };

    let config = toml::from_str::<BridgeConfig>(&content).map_err(|err| ConfigError::Parse {
        path: config_path.display().to_string(),
        reason: err.to_string(),
    })?;
    tracing::debug!("Loaded configuration from {}", config_path.display());
    Ok(config)
}

/// Settings supplied outside the config file. `None` leaves the file's value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub xmpp_address: Option<String>,
    pub xmpp_domain: Option<String>,
    pub jid: Option<String>,
    pub xmpp_password: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut BridgeConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(address) = self.xmpp_address {
            config.xmpp.address = address;
        }
        if let Some(domain) = self.xmpp_domain {
            config.xmpp.domain = domain;
        }
        if let Some(jid) = self.jid {
            config.xmpp.jid = jid;
        }
        if let Some(password) = self.xmpp_password {
            config.xmpp.password = password;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn explicit_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.toml");
        let err = load_config(Some(&path)).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mucbridge.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 8080

[xmpp]
address = "xmpp.example.org:5222"
domain = "example.org"
jid = "bridge@example.org"
password = "hunter2"

[room]
address = "lobby@conference.example.org"
"#,
        )
        .await
        .unwrap();

        let config = load_config(Some(&path)).await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.xmpp.address, "xmpp.example.org:5222");
        assert_eq!(config.room.address, "lobby@conference.example.org");
        assert_eq!(config.room.nickname_prefix, "bot");
        assert_eq!(config.session.channel_capacity, 256);
        config.validate().unwrap();
    }

    #[tokio::test]
    async fn invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mucbridge.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let err = load_config(Some(&path)).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let mut config = BridgeConfig::default();
        config.xmpp.jid = "file@example.org".into();
        config.xmpp.password = "from-file".into();

        ConfigOverrides {
            port: Some(9000),
            xmpp_password: Some("from-env".into()),
            ..Default::default()
        }
        .apply(&mut config);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.xmpp.jid, "file@example.org");
        assert_eq!(config.xmpp.password, "from-env");
    }
}

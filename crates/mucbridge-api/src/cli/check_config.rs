//! `mucbridge check-config`: show what the server would run with.

use mucbridge_types::config::BridgeConfig;

/// Print the configuration (password masked) and report validation problems.
pub fn check_config(config: &BridgeConfig) -> anyhow::Result<()> {
    println!("{}", render(config)?);

    match config.validate() {
        Ok(()) => {
            println!("# configuration is valid");
            Ok(())
        }
        Err(err) => Err(anyhow::anyhow!("configuration is invalid: {err}")),
    }
}

fn render(config: &BridgeConfig) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(&config.redacted())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_config_masks_password() {
        let mut config = BridgeConfig::default();
        config.xmpp.jid = "bridge@example.org".into();
        config.xmpp.password = "hunter2".into();

        let text = render(&config).unwrap();
        assert!(text.contains("bridge@example.org"));
        assert!(!text.contains("hunter2"));
        assert!(text.contains("[session]"));
    }
}

//! CLI definitions for the `mucbridge` binary.

pub mod check_config;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use mucbridge_infra::config::{ConfigOverrides, load_config};
use mucbridge_observe::tracing_setup::LogFormat;
use mucbridge_types::config::BridgeConfig;

/// WebSocket to XMPP multi-user chat bridge.
#[derive(Parser)]
#[command(name = "mucbridge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format.
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the chosen verbosity; `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info",
            1 => "info,mucbridge=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP/WebSocket bridge server.
    Serve {
        #[command(flatten)]
        config: ConfigArgs,

        /// Host to bind to (overrides `server.host`).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides `server.port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Export spans through OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Print the resolved configuration with secrets masked, then validate it.
    CheckConfig {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Config file location plus the XMPP settings accepted from the environment.
#[derive(Args)]
pub struct ConfigArgs {
    /// Path to the config file (default: ./mucbridge.toml if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// XMPP server address as host:port.
    #[arg(long, env = "XMPP_ADDRESS")]
    pub xmpp_address: Option<String>,

    /// XMPP service domain.
    #[arg(long, env = "XMPP_DOMAIN")]
    pub xmpp_domain: Option<String>,

    /// Account the bridge logs in as.
    #[arg(long, env = "JID")]
    pub jid: Option<String>,

    /// Account password.
    #[arg(long, env = "XMPP_PASSWORD", hide_env_values = true)]
    pub xmpp_password: Option<String>,
}

impl ConfigArgs {
    /// Load the config file and apply overrides from the environment and flags.
    pub async fn resolve(
        self,
        host: Option<String>,
        port: Option<u16>,
    ) -> anyhow::Result<BridgeConfig> {
        let mut config = load_config(self.config.as_deref()).await?;
        ConfigOverrides {
            host,
            port,
            xmpp_address: self.xmpp_address,
            xmpp_domain: self.xmpp_domain,
            jid: self.jid,
            xmpp_password: self.xmpp_password,
        }
        .apply(&mut config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "mucbridge",
            "-v",
            "serve",
            "--port",
            "8080",
            "--jid",
            "bridge@example.org",
            "--otel",
        ])
        .unwrap();

        assert_eq!(cli.log_filter(), "info,mucbridge=debug");
        match cli.command {
            Commands::Serve {
                config, port, otel, ..
            } => {
                assert_eq!(port, Some(8080));
                assert!(otel);
                assert_eq!(config.jid.as_deref(), Some("bridge@example.org"));
            }
            _ => panic!("expected serve"),
        }
    }
}

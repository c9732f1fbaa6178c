//! mucbridge entry point.
//!
//! Binary name: `mucbridge`
//!
//! Parses CLI arguments, loads configuration, then either starts the bridge
//! server or runs a one-off command.

mod cli;
mod http;
mod state;
mod tasks;

use std::sync::Arc;

use clap::Parser;
use clap_complete::generate;
use mucbridge_infra::xmpp::XmppConnector;
use mucbridge_observe::tracing_setup::{init_tracing, shutdown_tracing};
use mucbridge_types::config::BridgeConfig;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need logging or config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "mucbridge", &mut std::io::stdout());
        return Ok(());
    }

    let otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    init_tracing(cli.log_format.into(), cli.log_filter(), otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Serve {
            config, host, port, ..
        } => {
            let config = config.resolve(host, port).await?;
            serve(config).await
        }
        Commands::CheckConfig { config } => {
            let config = config.resolve(None, None).await?;
            cli::check_config::check_config(&config)
        }
        Commands::Completions { .. } => Ok(()),
    };

    shutdown_tracing();
    result
}

async fn serve(config: BridgeConfig) -> anyhow::Result<()> {
    config.validate()?;

    let connector = XmppConnector::from_config(&config.xmpp)?;
    let state = AppState::new(connector, config.clone());

    let event_log = tasks::spawn_event_log(state.bridge.events().subscribe());
    let sweeper = tasks::spawn_idle_sweeper(Arc::clone(&state.bridge), &config.session);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        xmpp = %config.xmpp.address,
        room = %config.room.address,
        "mucbridge listening"
    );

    let router = http::router::build_router(state.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    let closed = state.bridge.close_all().await;
    event_log.abort();
    tracing::info!(closed, "server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown requested");
}

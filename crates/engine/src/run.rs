use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use widgetry_shared::{run_line_reader, BridgeConfig, LineTransport, MessageBridge};

use crate::api::server;
use crate::app::App;
use crate::infrastructure::config::EngineConfig;

/// Creates a task that cancels `cancel_token` on SIGTERM/SIGINT
fn setup_shutdown_signal(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        cancel_token.cancel();
    });
}

pub async fn run() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr: stdout may carry the bridge
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "widgetry_engine=debug,widgetry_shared=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Widgetry Engine");

    let cancel_token = CancellationToken::new();
    setup_shutdown_signal(cancel_token.clone());

    let config = EngineConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Protocol: {}:{}", config.host, config.port);
    tracing::info!("  Bridge timeout: {}ms", config.bridge_timeout.as_millis());
    tracing::info!("  Stdio bridge: {}", config.stdio_bridge);

    let addr = config.bind_addr()?;

    let app = if config.stdio_bridge {
        let bridge = Arc::new(MessageBridge::new(
            "engine",
            Arc::new(LineTransport::new(tokio::io::stdout())),
            BridgeConfig::with_timeout(config.bridge_timeout),
        ));
        tokio::spawn(run_line_reader(
            tokio::io::stdin(),
            Arc::downgrade(&bridge),
            config.max_line_bytes,
            cancel_token.clone(),
        ));
        App::new(config, bridge)
    } else {
        App::detached(config)
    };
    let app = Arc::new(app);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind protocol server on {addr}"))?;

    server::serve(listener, Arc::clone(&app), cancel_token.clone()).await;

    app.shutdown().await;
    tracing::info!("Widgetry Engine stopped");
    Ok(())
}

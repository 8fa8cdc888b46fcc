//! Critic server binary.

use anyhow::{Context, Result};
use clap::Parser;
use critic_analyzers::AnalyzerRegistry;
use critic_core::config::AppConfig;
use critic_server::{AppState, create_router};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Critic - project storage and static analysis API
#[derive(Parser, Debug)]
#[command(name = "critic-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "CRITIC_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,

    /// Override the configured listen address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Critic v{}", env!("CARGO_PKG_VERSION"));

    // The file is optional; env vars can provide or override everything.
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("CRITIC_") && key != "CRITIC_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: critic-server --config /path/to/config.toml\n  \
             2. Environment variables: CRITIC_AUTH__JWT_SECRET=... critic-server\n\n\
             See config/server.example.toml for example configuration.\n\
             Set CRITIC_CONFIG env var to specify a default config file path."
        );
    }

    let mut config: AppConfig = figment
        .merge(Env::prefixed("CRITIC_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    critic_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let metadata = critic_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    metadata
        .health_check()
        .await
        .context("metadata health check failed")?;
    tracing::info!("Metadata store initialized");

    let analyzers = AnalyzerRegistry::from_config(&config.analyzers)
        .context("failed to initialize analyzers")?;

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    let state = AppState::new(config, metadata, analyzers)
        .context("failed to initialize application state")?;
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

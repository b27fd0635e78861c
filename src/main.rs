//! Main entry point for the hubwatch bridge service
//!
//! This is the production entry point that loads configuration, connects the
//! external handles (chat gateway, identity store, upstream API) and runs the
//! bridge with graceful shutdown.

use anyhow::Result;
use clap::Parser;
use hubwatch::chat::discord::{AppStateKey, BotHandler};
use hubwatch::chat::SerenityGateway;
use hubwatch::config::AppConfig;
use hubwatch::identity::PgIdentityLookup;
use hubwatch::service::AppState;
use hubwatch::upstream::HttpMatchApi;
use serenity::client::Client;
use serenity::model::gateway::GatewayIntents;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Hubwatch - esports hub to chat-platform bridge
#[derive(Parser)]
#[command(
    name = "hubwatch",
    version,
    about = "Bridges esports hub match webhooks to chat voice lobbies and stream announcements",
    long_about = "Hubwatch connects an esports hub's match lifecycle webhooks, queue listings \
                 and stream listings to a chat server: ephemeral voice channels per match, \
                 member verification against a relational lookup table, and a reconciled \
                 stream announcement channel."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Health port override
    #[arg(long, value_name = "PORT", help = "Override health server port")]
    health_port: Option<u16>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Query the running service's health endpoint and exit
    #[arg(long, help = "Perform a health check against a running instance and exit")]
    health_check: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if args.debug {
        config.service.log_level = "debug".to_string();
    }
    if let Some(port) = args.health_port {
        config.service.health_port = port;
    }

    Ok(config)
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Query a running instance's health endpoint and exit with its status
async fn perform_health_check(config: &AppConfig) -> Result<()> {
    let url = format!(
        "http://127.0.0.1:{}/health",
        config.service.health_port
    );
    match reqwest::get(&url).await {
        Ok(response) if response.status().is_success() => {
            println!("Health check passed");
            std::process::exit(0);
        }
        Ok(response) => {
            println!("Health check failed: {}", response.status());
            std::process::exit(1);
        }
        Err(e) => {
            println!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🚀 Hubwatch Bridge Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Health port: {}", config.service.health_port);
    info!("   Upstream: {}", config.upstream.base_url);
    info!(
        "   Hubs: {}",
        config
            .hubs
            .iter()
            .map(|hub| hub.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!(
        "   Stream poll interval: {}s",
        config.streams.poll_interval_seconds
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.health_check {
        return perform_health_check(&config).await;
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    // Missing external handles are the one process-fatal misconfiguration
    if config.chat.token.is_empty() {
        error!("DISCORD_TOKEN is not set");
        std::process::exit(1);
    }
    if config.upstream.api_key.is_empty() {
        warn!("FACEIT_KEY is not set; upstream calls will be rejected");
    }

    info!("Connecting to the member store...");
    let identity = match PgIdentityLookup::connect(&config.identity.database_url).await {
        Ok(identity) => Arc::new(identity),
        Err(e) => {
            error!("Failed to connect to the member store: {:#}", e);
            std::process::exit(1);
        }
    };

    let api = Arc::new(HttpMatchApi::new(&config.upstream)?);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&config.chat.token, intents)
        .event_handler(BotHandler)
        .await?;

    let gateway = Arc::new(SerenityGateway::new(
        client.http.clone(),
        client.cache.clone(),
    ));

    info!("Initializing service components...");
    let app = Arc::new(AppState::new(config.clone(), gateway, identity, api)?);
    app.health_server().attach_app_state(app.clone());
    app.start();

    {
        let mut data = client.data.write().await;
        data.insert::<AppStateKey>(app.clone());
    }

    // Graceful shutdown: stop background tasks, then the gateway shards
    let shard_manager = client.shard_manager.clone();
    let shutdown_app = app.clone();
    let shutdown_timeout = config.shutdown_timeout();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        shutdown_app.stop();
        if tokio::time::timeout(shutdown_timeout, shard_manager.shutdown_all())
            .await
            .is_err()
        {
            warn!("⚠️  Shutdown timeout exceeded, forcing exit");
            std::process::exit(1);
        }
    });

    info!("✅ Hubwatch is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    if let Err(e) = client.start().await {
        error!("Chat client error: {:#}", e);
    }

    info!("🛑 Hubwatch stopped");
    Ok(())
}

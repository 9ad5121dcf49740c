//! Latchkey - single-use door unlock tokens behind a webhook relay
//!
//! Issues short-lived, single-use access tokens to browser sessions and
//! exchanges a valid token for a trigger call to the door relay.

use anyhow::Result;
use clap::Parser;
use latchkey_core::Config;
use latchkey_relay::RelayClient;
use latchkey_server::{create_router, AppState};
use latchkey_token::{TokenManager, TokenStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Latchkey - issue single-use door unlock tokens
#[derive(Parser, Debug)]
#[command(name = "latchkey")]
#[command(version, about, long_about = None)]
struct Args {
    /// Server port
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Token lifetime in seconds
    #[arg(short = 't', long, default_value = "900")]
    token_ttl: u64,

    /// Relay endpoint triggered on unlock
    #[arg(short, long, default_value = "http://127.0.0.1:8444/trigger")]
    relay_url: String,

    /// Relay request timeout in seconds
    #[arg(long, default_value = "10")]
    relay_timeout: u64,

    /// Token store path (defaults to ~/.config/latchkey/tokens.json)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("Latchkey v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::new()
        .with_port(args.port)
        .with_token_ttl_secs(args.token_ttl)
        .with_relay_url(args.relay_url)
        .with_relay_timeout_secs(args.relay_timeout)
        .with_store_path(args.store);

    // Initialize the token store
    info!("Initializing token store...");
    let store = match &config.store_path {
        Some(path) => TokenStore::with_path(path.clone()).await?,
        None => TokenStore::new().await?,
    };
    let store = Arc::new(store);

    let issued = store.token_count().await;
    if issued > 0 {
        info!("Loaded {} previously issued tokens", issued);
    }

    let tokens = Arc::new(TokenManager::new(store, config.token_ttl()));
    let relay = RelayClient::new(config.relay_url.clone(), config.relay_timeout())?;

    info!(
        "Relay endpoint: {} (timeout {}s)",
        config.relay_url, config.relay_timeout_secs
    );
    info!("Token lifetime: {}s", config.token_ttl_secs);

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), tokens, relay));
    let router = create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting server on port {}...", config.port);
    info!("Press Ctrl+C to stop.");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Goodbye!");
    Ok(())
}

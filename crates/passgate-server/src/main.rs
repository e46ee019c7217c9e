//! Passgate - Identity service for token-authenticated microservices

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use passgate_api::{AppState, create_router};
use passgate_auth::{RevocationRegistry, TokenCodec, spawn_prune_task};
use passgate_core::{IdentityService, Registration};
use passgate_db::Database;

/// Passgate - Identity service issuing and verifying access tokens
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "PASSGATE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PASSGATE_PORT")]
    port: Option<u16>,

    /// Token signing secret
    #[arg(long, env = "PASSGATE_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(secret) = args.jwt_secret {
        config.auth.jwt_secret = Some(secret);
    }

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format);

    config.validate()?;

    info!("Starting Passgate v{}", env!("CARGO_PKG_VERSION"));

    // Create data directory
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize database
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path).await?;
    let has_users = db.has_users().await?;

    // Initialize token codec
    let ttl = chrono::Duration::seconds(config.auth.token_ttl_secs);
    let codec = match &config.auth.jwt_secret {
        Some(secret) => TokenCodec::new(secret.as_bytes(), ttl),
        None => {
            warn!("No signing secret configured; tokens will not survive a restart");
            TokenCodec::with_random_secret(ttl)
        }
    };

    // Revocation registry and its prune task
    let revocations = Arc::new(RevocationRegistry::new());
    let prune_interval =
        std::time::Duration::from_secs(config.auth.revocation_prune_interval_secs);
    let _prune_handle = spawn_prune_task(revocations.clone(), prune_interval);

    // Initialize identity service
    let identity = Arc::new(IdentityService::new(db, codec, revocations)?);

    // Create bootstrap admin if configured
    if let Some(admin) = &config.admin {
        let created = identity
            .ensure_admin(Registration {
                username: admin.username.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
                first_name: admin.first_name.clone(),
                last_name: admin.last_name.clone(),
            })
            .await?;
        if created {
            info!("Admin user created (username: {})", admin.username);
        }
    } else if !has_users {
        warn!("No users exist and no [admin] section is configured");
    }

    // Create router
    let app = create_router(AppState::new(identity)).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);
    info!("Token lifetime: {} seconds", config.auth.token_ttl_secs);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

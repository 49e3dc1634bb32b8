//! vislog-server - visitor logger with a live dashboard
//!
//! Every `GET /log` is enriched (device, OS, browser, location), stored in
//! SQLite and pushed to connected dashboards.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vislog_common::config::{self, ConfigOverrides, ServerConfig, TomlConfig};
use vislog_common::events::EventBus;
use vislog_server::db::{self, VisitStore};
use vislog_server::enrich::{Enricher, IpApiClient};
use vislog_server::{build_router, AppState};

/// Command-line arguments for vislog-server
#[derive(Parser, Debug)]
#[command(name = "vislog-server")]
#[command(about = "Visitor logger with a live dashboard")]
#[command(version)]
struct Args {
    /// Port to listen on [default: 3001]
    #[arg(short, long, env = "VISLOG_PORT")]
    port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(short, long, env = "VISLOG_BIND")]
    bind: Option<String>,

    /// Folder holding vislog.db (also read from VISLOG_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file [default: ~/.config/vislog/config.toml if present]
    #[arg(short, long, env = "VISLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the ip-api.com compatible geolocation service
    #[arg(long, env = "VISLOG_GEO_API_URL")]
    geo_api_url: Option<String>,

    /// Built dashboard to serve instead of the embedded page
    #[arg(long, env = "VISLOG_STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vislog_server=info,vislog_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting vislog-server v{}", env!("CARGO_PKG_VERSION"));

    let toml_config = match &args.config {
        Some(path) => TomlConfig::load(path)?,
        None => TomlConfig::load_default()?,
    };

    let config = ServerConfig::resolve(
        ConfigOverrides {
            root_folder: args.root_folder,
            port: args.port,
            bind: args.bind,
            geo_api_url: args.geo_api_url,
            static_dir: args.static_dir,
        },
        &toml_config,
    )?;

    config::ensure_directory_exists(&config.root_folder)?;
    let db_path = config.database_path();
    info!("Database: {}", db_path.display());

    let pool = db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let event_bus = EventBus::new(config.event_capacity);

    let geo = IpApiClient::new(config.geo_api_url.clone())
        .context("Failed to build geolocation client")?;
    info!("Geolocation service: {}", geo.base_url());

    let state = AppState::new(
        VisitStore::new(pool),
        event_bus,
        Enricher::new(Arc::new(geo)),
    )
    .with_static_dir(config.static_dir.clone());

    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Dashboard: http://{}", addr);
    info!("Log URL: http://{}/log", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
///
/// Cancels `shutdown` so long-lived SSE streams let the server drain.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }

    shutdown.cancel();
}

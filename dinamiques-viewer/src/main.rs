//! dinamiques-viewer - catalog HTTP service
//!
//! Loads the configured catalog once at startup and serves listing, detail,
//! statistics and catalog-session endpoints. A failed initial load is not
//! fatal: the service starts empty and `/api/reload` can retry.

use anyhow::{Context, Result};
use clap::Parser;
use dinamiques_common::config::{
    find_config_file, load_toml_config, ConfigOverrides, LoggingConfig, Settings, TomlConfig,
};
use dinamiques_common::favorites::{Favorites, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use dinamiques_common::source::{source_from_settings, DataSource};
use dinamiques_common::{Catalog, QualityScale};
use dinamiques_viewer::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dinamiques-viewer")]
#[command(about = "Catalog viewer for pedagogical dynamics")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "DINAMIQUES_PORT")]
    port: Option<u16>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "DINAMIQUES_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog document; overrides DINAMIQUES_DATA and the config file
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Scale the dataset's quality scores use (5 or 10)
    #[arg(long)]
    quality_scale: Option<QualityScale>,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so its [logging] section applies
    let config_path = args.config.clone().or_else(find_config_file);
    let config = match &config_path {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?,
        None => TomlConfig::default(),
    };

    init_tracing(&config.logging)?;

    info!("Starting dinamiques-viewer v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Loaded TOML configuration from {}", path.display()),
        None => warn!("No config file found, using defaults"),
    }

    let settings = Settings::resolve(
        config,
        ConfigOverrides {
            port: args.port,
            data_path: args.data,
            quality_scale: args.quality_scale,
        },
    );

    let favorites_store: Arc<dyn KeyValueStore> = match &settings.favorites_path {
        Some(path) => {
            info!("Favorites file: {}", path.display());
            Arc::new(FileKeyValueStore::new(path))
        }
        None => {
            info!("No favorites_path configured, favorites are kept in memory");
            Arc::new(MemoryKeyValueStore::new())
        }
    };
    let favorites = Favorites::load(favorites_store.as_ref());

    let source: Arc<dyn DataSource> = Arc::from(
        source_from_settings(&settings).context("Failed to set up catalog source")?,
    );
    info!(
        source = %source.describe(),
        quality_scale = u8::from(settings.quality_scale),
        page_size = settings.page_size,
        search_debounce_ms = settings.search_debounce.as_millis() as u64,
        "Catalog source configured"
    );

    let mut catalog = Catalog::new(settings.page_size, settings.quality_scale, favorites);
    if let Err(e) = catalog.load_from(source.as_ref()).await {
        warn!("Initial catalog load failed, starting empty: {}", e);
    }

    let state = AppState::new(
        catalog,
        source,
        favorites_store,
        settings.result_cap,
        settings.search_debounce,
    );
    let app = build_router(state);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("dinamiques-viewer listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("dinamiques-viewer stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

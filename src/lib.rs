pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod sync;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use clients::anilist::AnilistClient;
use clients::fribb::FribbClient;
pub use config::Config;
use db::Store;
use sync::Synchronizer;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let clean = if config.debug.enabled {
        config.debug.clean_database_on_start
    } else {
        if config.debug.clean_database_on_start {
            warn!("Database cleanup ignored: debug mode disabled");
        }
        false
    };

    let store = Store::connect(&config.database.connection_url(), clean)
        .await
        .context("Failed to connect to database")?;

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("sync") | Some("check") => run_single_pass(config, store).await,
        Some("daemon") | None => run_daemon(config, store).await,
        Some("help") | Some("-h") | Some("--help") => {
            print_help();
            Ok(())
        }
        Some(other) => {
            println!("Unknown command: {other}");
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("anisync - AniList metadata synchronizer");
    println!();
    println!("USAGE:");
    println!("  anisync [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("  daemon   Run the daily synchronizer and the read API (default)");
    println!("  sync     Run a single sync pass and exit");
    println!("  help     Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Set DB_*, SERVER_*, SYNC_* and LOG_LEVEL in the environment or .env");
}

fn build_synchronizer(config: &Config, store: Store) -> anyhow::Result<Synchronizer> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let fetcher = Arc::new(AnilistClient::new(
        http_client.clone(),
        config.sync.retry.clone(),
    ));
    let mappings = Arc::new(FribbClient::new(http_client));

    Ok(Synchronizer::new(
        store,
        fetcher,
        mappings,
        config.sync.clone(),
    ))
}

async fn run_single_pass(config: Config, store: Store) -> anyhow::Result<()> {
    let synchronizer = build_synchronizer(&config, store)?;
    let stats = synchronizer.run_once().await?;

    println!(
        "Sync completed - Processed: {}, Errors: {}",
        stats.processed, stats.errors
    );
    Ok(())
}

async fn run_daemon(config: Config, store: Store) -> anyhow::Result<()> {
    info!(
        "anisync v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let sync_handle = if config.sync.enabled {
        let synchronizer = build_synchronizer(&config, store.clone())?;
        Some(tokio::spawn(async move {
            if let Err(e) = synchronizer.run().await {
                error!("Synchronizer error: {e:#}");
            }
        }))
    } else {
        info!("Synchronizer disabled in config");
        None
    };

    let server_handle = if config.server.enabled {
        let state = Arc::new(api::AppState {
            store: store.clone(),
        });
        let app = api::router(state);
        let addr = format!("0.0.0.0:{}", config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Read API listening on http://{addr}");

        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("API server error: {e}");
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }

    if let Some(handle) = sync_handle {
        handle.abort();
    }
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}

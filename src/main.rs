//! Tubewatch main entry point
//!
//! Serves the read API and runs the background fetcher until interrupted.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tubewatch::api::{self, AppState, PaginationReader};
use tubewatch::config::{load_config_with_hash, Config};
use tubewatch::storage::{SharedStore, SqliteStorage, VideoStore};
use tubewatch::{FetchCoordinator, YouTubeClient};

/// Tubewatch: polls video search for a query and serves what it finds
#[derive(Parser, Debug)]
#[command(name = "tubewatch")]
#[command(version)]
#[command(about = "Incremental video-search poller with a paginated read API", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would run, then exit
    #[arg(long, conflicts_with_all = ["stats", "once"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "once"])]
    stats: bool,

    /// Run a single fetch cycle and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.once {
        handle_once(config).await?;
    } else {
        handle_serve(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tubewatch=info,warn"),
            1 => EnvFilter::new("tubewatch=debug,tower_http=debug,info"),
            2 => EnvFilter::new("tubewatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.storage.database_path);
    SqliteStorage::new(path).with_context(|| format!("failed to open database {}", path.display()))
}

/// Handles the --dry-run mode
fn handle_dry_run(config: &Config) {
    println!("=== Tubewatch Dry Run ===\n");

    println!("Upstream:");
    println!("  Base URL: {}", config.youtube.api_base_url);
    println!("  Query: {}", config.youtube.search_query);
    println!("  API keys: {}", config.youtube.api_keys.len());
    println!("  Max results per call: {}", config.youtube.max_results);

    println!("\nFetcher:");
    println!("  Interval: {}s", config.fetcher.interval_secs);
    println!("  Fallback window: {}s", config.fetcher.fallback_window_secs);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nServer:");
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!(
        "  Page size: default {}, max {}",
        config.server.default_limit, config.server.max_limit
    );
    println!("  Allowed origins: {}", config.server.allowed_origins.join(", "));

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let storage = open_store(config)?;

    println!("Database: {}\n", config.storage.database_path);
    println!("Stored videos: {}", storage.count_videos()?);
    match storage.latest_published_at()? {
        Some(latest) => println!("Latest published: {}", latest.to_rfc3339()),
        None => println!("Latest published: (none)"),
    }

    Ok(())
}

/// Handles the --once mode
async fn handle_once(config: Config) -> anyhow::Result<()> {
    let store = SharedStore::new(open_store(&config)?);
    let client = YouTubeClient::new(&config.youtube).context("failed to create search client")?;
    let mut coordinator = FetchCoordinator::new(
        client,
        store,
        &config.fetcher,
        config.youtube.search_query.clone(),
    );

    let report = coordinator.run_cycle(&CancellationToken::new()).await?;
    tracing::info!(
        fetched = report.fetched,
        stored = report.stored,
        watermark = %report.watermark,
        "Fetch cycle complete"
    );

    Ok(())
}

/// Handles the default mode: serve the read API and fetch in the background
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let store = SharedStore::new(open_store(&config)?);
    let client = YouTubeClient::new(&config.youtube).context("failed to create search client")?;

    let coordinator = FetchCoordinator::new(
        client,
        store.clone(),
        &config.fetcher,
        config.youtube.search_query.clone(),
    );
    let fetch_handle = coordinator.start();

    let shutdown = CancellationToken::new();
    let reader = PaginationReader::new(store, &config.server);
    let app = api::router(
        AppState::new(reader, shutdown.clone()),
        &config.server.allowed_origins,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    api::serve(listener, app, shutdown, shutdown_signal())
        .await
        .context("server error")?;

    fetch_handle.stop().await?;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install CTRL+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Received shutdown signal");
}

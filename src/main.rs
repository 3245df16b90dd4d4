//! Magz main entry point
//!
//! This is the command-line interface for the Magz library cataloger.

use clap::Parser;
use magz::config::{load_config_with_hash, Config};
use magz::output::{load_statistics, print_statistics};
use magz::storage::open_store;
use magz::Library;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

/// Magz: an incremental comic and magazine cataloger
///
/// Magz walks the configured library roots, keeps a SQLite catalog of every
/// cbz, cbr and image directory in sync with the disk, and stores an embedded
/// cover thumbnail for each entry.
#[derive(Parser, Debug)]
#[command(name = "magz")]
#[command(version = "1.0.0")]
#[command(about = "An incremental comic and magazine cataloger", long_about = None)]
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

    /// Run a single scan pass and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "pages"])]
    once: bool,

    /// Validate config and list what would be cataloged without scanning
    #[arg(long, conflicts_with_all = ["once", "stats", "pages"])]
    dry_run: bool,

    /// Show statistics from the catalog database and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run", "pages"])]
    stats: bool,

    /// List the pages of one container and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["once", "dry_run", "stats"])]
    pages: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(config, &config_hash)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(path) = cli.pages {
        handle_pages(config, &config_hash, &path)?;
    } else {
        handle_scan(config, &config_hash, cli.once).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("magz=info,warn"),
            1 => EnvFilter::new("magz=debug,info"),
            2 => EnvFilter::new("magz=trace,debug"),
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

/// Handles the --dry-run mode: validates config and lists discovered items
fn handle_dry_run(config: Config, config_hash: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Magz Dry Run ===\n");

    println!("Scan Configuration:");
    println!("  Workers: {}", config.scan.workers);
    println!("  Thumbnail permits: {}", config.scan.thumbnail_permits);
    println!("  Refresh interval: {} min", config.scan.refresh_interval);
    println!("  Queue capacity: {}", config.scan.queue_capacity);
    println!("  Thumbnail max dimension: {}px", config.thumbnail.max_dimension);

    println!("\nCache:");
    println!("  Database: {}", config.cache.database_path.display());

    println!("\nLibrary Roots ({}):", config.library.roots.len());
    for root in &config.library.roots {
        println!("  - {}", root.display());
    }

    // An in-memory store keeps the real catalog untouched
    let store = magz::SqliteStore::new_in_memory()?;
    let library = Library::from_parts(config, store, config_hash)?;
    let found = library.discover();

    println!("\nContainers ({}):", found.len());
    for container in &found {
        println!(
            "  [{}] {} / {}",
            container.kind().label(),
            container.category(),
            container.title()
        );
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would catalog {} containers", found.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.cache.database_path.display());

    let store = open_store(&config.cache.database_path)?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --pages mode: lists one container's pages in reading order
fn handle_pages(
    config: Config,
    config_hash: &str,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::open(config, config_hash)?;
    let pages = match library.list_pages(path) {
        Ok(pages) => pages,
        Err(e) => {
            tracing::error!("Cannot list pages of {}: {}", path.display(), e);
            return Err(e.into());
        }
    };

    for (index, page) in pages.iter().enumerate() {
        println!("{:>4}  {}", index + 1, page);
    }

    Ok(())
}

/// Handles the main scan operation: initial pass, then periodic refresh
async fn handle_scan(
    config: Config,
    config_hash: &str,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let period = config.scan.refresh_period();
    tracing::info!(
        "Library roots: {}, workers: {}, thumbnail permits: {}",
        config.library.roots.len(),
        config.scan.workers,
        config.scan.thumbnail_permits
    );

    let library = Arc::new(Library::open(config, config_hash)?);

    match library.trigger_scan().await {
        Ok(report) => tracing::info!("Initial scan complete: {}", report),
        Err(e) => {
            tracing::error!("Initial scan failed: {}", e);
            return Err(e.into());
        }
    }

    if once {
        return Ok(());
    }

    tracing::info!("Refreshing every {} minutes", period.as_secs() / 60);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let library = Arc::clone(&library);
                tokio::spawn(async move {
                    match library.try_trigger_scan().await {
                        Ok(Some(report)) => tracing::info!("Refresh complete: {}", report),
                        Ok(None) => {}
                        Err(e) => tracing::error!("Refresh failed: {}", e),
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    // Passes are never cancelled mid-way
    library.wait_idle().await;
    tracing::info!("Stopped");

    Ok(())
}

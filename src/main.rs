//! cityjobs-sync main entry point
//!
//! This is the command-line interface for the incremental jobs-board mirror.

use anyhow::Context;
use cityjobs_sync::config::{load_config_with_hash, Config, StoreBackend};
use cityjobs_sync::output::{load_statistics, print_page, print_statistics};
use cityjobs_sync::storage::open_store;
use cityjobs_sync::sync::{SyncOrchestrator, SyncSettings};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// cityjobs-sync: an incremental mirror of a public jobs board
///
/// Scrapes every page of job listings, merges them with the stored
/// collection without losing posted dates already fetched, and then fills
/// in the missing posted dates from each listing's detail page.
#[derive(Parser, Debug)]
#[command(name = "cityjobs-sync")]
#[command(version = "1.0.0")]
#[command(about = "An incremental mirror of a public jobs board", long_about = None)]
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

    /// Show the stored jobs and finish missing details instead of rescanning
    #[arg(long, conflicts_with_all = ["reset_details", "stats", "dry_run", "show_page"])]
    load: bool,

    /// Clear every stored posted date so the next run fetches them again
    #[arg(long, conflicts_with_all = ["load", "stats", "dry_run", "show_page"])]
    reset_details: bool,

    /// Show statistics from the store and exit
    #[arg(long, conflicts_with_all = ["load", "reset_details", "dry_run", "show_page"])]
    stats: bool,

    /// Validate config and show what would be scanned without fetching anything
    #[arg(long, conflicts_with_all = ["load", "reset_details", "stats", "show_page"])]
    dry_run: bool,

    /// Print one page of the stored jobs and exit
    #[arg(long, value_name = "PAGE", conflicts_with_all = ["load", "reset_details", "stats", "dry_run"])]
    show_page: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);
    if config.debug.enabled {
        tracing::info!(
            "Debug mode: {} jobs per page, at most {} pages",
            config.debug.page_size,
            config.debug.max_pages
        );
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(page) = cli.show_page {
        handle_show_page(&config, page)?;
    } else if cli.reset_details {
        handle_reset(&config).await?;
    } else if cli.load {
        handle_load(&config).await?;
    } else {
        handle_rescan(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cityjobs_sync=info,warn"),
            1 => EnvFilter::new("cityjobs_sync=debug,info"),
            2 => EnvFilter::new("cityjobs_sync=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be scanned
fn handle_dry_run(config: &Config) {
    let settings = SyncSettings::from_config(config);

    println!("=== cityjobs-sync Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Listing path: {}", config.site.listing_path);
    println!("  Jobs per page: {}", settings.page_size);
    match settings.max_pages {
        Some(cap) => println!("  Page limit: {}", cap),
        None => println!("  Page limit: none"),
    }

    println!("\nRate Limits:");
    println!(
        "  Between pages: {}-{}ms",
        config.rate_limit.page_delay_min_ms, config.rate_limit.page_delay_max_ms
    );
    println!(
        "  Between detail pages: {}-{}ms",
        config.rate_limit.detail_delay_min_ms, config.rate_limit.detail_delay_max_ms
    );

    println!("\nFetching:");
    println!("  User agent: {}", config.user_agent.value);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Attempts: {}", config.fetch.max_attempts);
    println!("  Enrichment batch size: {}", settings.batch_size);

    println!("\nStore:");
    let backend = match config.store.backend {
        StoreBackend::Json => "json",
        StoreBackend::Sqlite => "sqlite",
    };
    println!("  Backend: {}", backend);
    println!("  Path: {}", config.store.path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Store: {}\n", config.store.path);

    let store = open_store(&config.store)?;
    let stats = load_statistics(store.as_ref())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --show-page mode: prints one page of stored jobs
fn handle_show_page(config: &Config, page: u32) -> anyhow::Result<()> {
    let sync = SyncOrchestrator::from_config(config)?;
    sync.set_page(page);
    print_page(&sync.snapshot());
    Ok(())
}

/// Handles the --reset-details mode
async fn handle_reset(config: &Config) -> anyhow::Result<()> {
    let sync = SyncOrchestrator::from_config(config)?;
    let cleared = sync.reset_details().await?;
    println!("✓ Cleared details of {} jobs", cleared.len());
    Ok(())
}

/// Handles the --load mode: shows stored jobs, then finishes their details
async fn handle_load(config: &Config) -> anyhow::Result<()> {
    let sync = SyncOrchestrator::from_config(config)?;
    let report = sync.load_stored().await?;

    print_page(&sync.snapshot());
    if report.enrichment_started {
        tracing::info!("Fetching details for {} jobs", report.pending);
        wait_for_enrichment(&sync).await?;
    }

    Ok(())
}

/// Handles the main rescan operation
async fn handle_rescan(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting rescan of {}", config.site.base_url);

    let sync = SyncOrchestrator::from_config(config)?;
    let report = sync.rescan().await?;

    println!(
        "✓ Stored {} jobs from {} pages ({} kept their details)",
        report.listings, report.pages_scanned, report.preserved
    );

    if report.enrichment_started {
        wait_for_enrichment(&sync).await?;
    }

    Ok(())
}

/// Waits for background enrichment, cancelling it on Ctrl-C
///
/// Work committed before the interrupt stays in the store.
async fn wait_for_enrichment(sync: &SyncOrchestrator) -> anyhow::Result<()> {
    let wait = sync.wait_for_enrichment();
    tokio::pin!(wait);

    let interrupted = tokio::select! {
        result = &mut wait => {
            if let Some(outcome) = result? {
                println!(
                    "✓ Fetched details for {} of {} jobs ({} failed)",
                    outcome.enriched, outcome.pending, outcome.failed
                );
            }
            false
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            true
        }
    };

    if interrupted {
        tracing::warn!("Interrupted, saving enrichment progress");
        sync.cancel_enrichment();
        if let Some(outcome) = wait.await? {
            println!(
                "Stopped after {} of {} jobs; run with --load to continue",
                outcome.attempted, outcome.pending
            );
        }
    }

    Ok(())
}

//! Shelfmark main entry point
//!
//! This is the command-line interface for the Shelfmark catalog crawler.

use anyhow::Context;
use clap::Parser;
use shelfmark::config::{engine_warnings, load_config_with_hash, Config};
use shelfmark::crawler::run_session;
use shelfmark::output::{load_statistics, print_statistics};
use shelfmark::storage::{open_store, reset_frontiers, StateStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Shelfmark: a resumable book catalog crawler
///
/// Shelfmark discovers subject pages on a book catalog, paginates them for book links and
/// extracts one metadata record per book. Progress is kept in JSON state files, so every
/// run continues where the previous one stopped.
#[derive(Parser, Debug)]
#[command(name = "shelfmark")]
#[command(version = "1.0.0")]
#[command(about = "A resumable book catalog crawler", long_about = None)]
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

    /// Empty the open subject and book frontiers before crawling (the block-list is kept)
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the state files and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let store = Arc::new(open_store(&config.output));

    if cli.dry_run {
        handle_dry_run(&config, store.as_ref())?;
    } else if cli.stats {
        handle_stats(&config, store.as_ref())?;
    } else {
        handle_crawl(config, store, cli.fresh).await?;
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
            0 => EnvFilter::new("shelfmark=info,warn"),
            1 => EnvFilter::new("shelfmark=debug,info"),
            2 => EnvFilter::new("shelfmark=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, store: &dyn StateStore) -> anyhow::Result<()> {
    println!("=== Shelfmark Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Engine: {:?} (headless: {})", config.crawler.engine, config.crawler.headless);
    println!("  Subject limit: {}", config.crawler.subject_limit);
    println!("  Book limit: {}", config.crawler.book_limit);
    println!("  Worker pool size: {}", config.crawler.worker_pool_size);
    println!("  Max pagination steps: {}", config.crawler.max_pagination_steps);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay);
    println!("  Jitter: {:?}ms", config.crawler.jitter);
    println!("  Metadata concurrency: {}", config.crawler.metadata_concurrency);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nIdentity:");
    println!("  User agent: {}", config.identity.user_agent);
    println!(
        "  Crawler: {}/{}",
        config.identity.crawler_name, config.identity.crawler_version
    );
    println!("  Contact: {} / {}", config.identity.contact_url, config.identity.contact_email);
    println!("  Purpose: {}", config.identity.purpose);

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Subjects listing: {}", config.site.subjects_path);

    println!("\nState files:");
    println!("  Blocked subjects: {}", config.output.blocked_subjects_path);
    println!("  Open subjects: {}", config.output.open_subjects_path);
    println!("  Book links: {}", config.output.book_links_path);
    println!("  Records: {}", config.output.records_path);

    let open = store.load_open()?;
    let books = store.load_books()?;
    let blocked = store.load_blocked()?;

    println!("\n✓ Configuration is valid");
    for warning in engine_warnings(config) {
        println!("! {}", warning);
    }
    println!(
        "✓ Frontiers: {} blocked, {} open subjects, {} book links ({} unscraped)",
        blocked.subjects.len(),
        open.subjects.len(),
        books.books.len(),
        books.not_scraped()
    );
    if open.subjects.is_empty() {
        println!("✓ Would seed subjects from {}{}", config.site.base_url, config.site.subjects_path);
    } else {
        let workers = open.subjects.len().min(config.crawler.worker_pool_size);
        println!("✓ Would paginate {} subjects:", workers);
        for subject in open.subjects.iter().take(workers) {
            println!("  - {} ({})", subject.name, subject.link);
        }
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the state files
fn handle_stats(config: &Config, store: &dyn StateStore) -> anyhow::Result<()> {
    let stats = load_statistics(
        store,
        Path::new(&config.output.records_path),
        config.crawler.subject_limit,
        config.crawler.book_limit,
    )?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, store: Arc<dyn StateStore>, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (clearing subject and book frontiers)");
        reset_frontiers(store.as_ref())?;
    } else {
        tracing::info!("Starting crawl (resuming from saved frontiers)");
    }

    match run_session(config, store).await {
        Ok(records) => {
            tracing::info!("Crawl completed successfully ({} records)", records.len());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

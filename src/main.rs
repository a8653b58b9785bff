//! Driftnet main entry point
//!
//! This is the command-line interface for the Driftnet crawler.

use clap::Parser;
use driftnet::config::{load_config_with_hash, Config};
use driftnet::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Driftnet: a concurrent web crawler
///
/// Driftnet fetches the configured seed URLs, extracts items with CSS
/// selectors, follows links, and writes the items to the configured outputs
/// until the crawl runs out of work, its lifetime elapses, or it is
/// interrupted with Ctrl-C.
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version)]
#[command(about = "A concurrent web crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Items go to stdout, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Driftnet Dry Run ===\n");

    println!("Spider Configuration:");
    println!("  Concurrency: {}", unbounded_or(config.spider.concurrency as u64, ""));
    println!("  Lifetime: {}", unbounded_or(config.spider.lifetime_secs, "s"));
    println!("  Max retries: {}", config.spider.max_retries);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nExtract:");
    println!("  Selector: {}", config.extract.selector);
    if let Some(attribute) = &config.extract.attribute {
        println!("  Attribute: {}", attribute);
    }
    if let Some(follow) = &config.extract.follow {
        println!("  Follow: {}", follow);
    }

    println!("\nOutputs:");
    if config.output.console {
        println!("  - console");
    }
    if let Some(file) = &config.output.file {
        println!("  - file: {}", file);
    }
    if let Some(database) = &config.output.database {
        println!("  - database: {}", database);
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

fn unbounded_or(value: u64, unit: &str) -> String {
    if value == 0 {
        "unbounded".to_string()
    } else {
        format!("{}{}", value, unit)
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Total seed URLs: {}", config.seeds.len());

    match crawl(config).await {
        Ok(reason) => {
            tracing::info!("Crawl finished: {}", reason);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed to start: {}", e);
            Err(e.into())
        }
    }
}

//! Crawler module: the spider engine and its HTTP transport
//!
//! This module contains the core crawling logic, including:
//! - Queue, counters, and stop latch (`scheduler`)
//! - The run loop and concurrent dispatch tasks (`spider`)
//! - HTTP fetching behind the `Transport` trait (`fetcher`)
//! - Wiring a spider from a loaded configuration (`crawl`)

mod fetcher;
mod scheduler;
mod spider;

pub use fetcher::{build_http_client, ReqwestTransport, Transport};
pub use scheduler::{Progress, StopReason};
pub use spider::{Spider, SpiderHandle, SpiderOptions};

use crate::config::Config;
use crate::handler::{Retrying, SelectorHandler};
use crate::http::Request;
use crate::storage::{ConsoleStorage, FileStorage, SqliteStorage};
use std::path::Path;
use std::time::Duration;

/// Builds a spider from a loaded configuration
///
/// This wires up:
/// 1. A reqwest transport with the configured user agent
/// 2. A selector handler, wrapped for retries if `max-retries` is set
/// 3. The configured console, file, and SQLite storages
/// 4. One GET bootstrap request per seed URL
pub fn build_spider(config: &Config) -> crate::Result<Spider> {
    let client = build_http_client(&config.user_agent).map_err(crate::ConfigError::from)?;

    let mut handler = SelectorHandler::new(&config.extract.selector)?;
    if let Some(attribute) = &config.extract.attribute {
        handler = handler.attribute(attribute.clone());
    }
    if let Some(follow) = &config.extract.follow {
        handler = handler.follow(follow)?;
    }

    let mut options = SpiderOptions::new()
        .client(ReqwestTransport::with_client(client))
        .lifetime(Duration::from_secs(config.spider.lifetime_secs))
        .concurrency(config.spider.concurrency);

    options = if config.spider.max_retries > 0 {
        options.handler(Retrying::new(handler, config.spider.max_retries))
    } else {
        options.handler(handler)
    };

    if config.output.console {
        options = options.storage(ConsoleStorage::new());
    }
    if let Some(path) = &config.output.file {
        options = options.storage(FileStorage::open(path)?);
    }
    if let Some(path) = &config.output.database {
        options = options.storage(SqliteStorage::open(Path::new(path))?);
    }

    for seed in &config.seeds {
        options = options.bootstrap(Request::get(seed.parse()?));
    }

    Ok(Spider::new(options)?)
}

/// Runs a complete crawl from a configuration
///
/// Ctrl-C stops the crawl with `StopReason::ManualStop`.
///
/// # Example
///
/// ```no_run
/// use driftnet::config::load_config;
/// use driftnet::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("driftnet.toml"))?;
/// let reason = crawl(&config).await?;
/// println!("Crawl ended: {}", reason);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config) -> crate::Result<StopReason> {
    let spider = build_spider(config)?;

    let handle = spider.handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping");
            handle.stop();
        }
    });

    let reason = spider.run().await;
    interrupt.abort();
    Ok(reason)
}

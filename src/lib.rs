//! Driftnet: an embeddable concurrent web crawler
//!
//! This crate implements a crawl engine that fetches requests concurrently,
//! hands every response to a pluggable handler, writes the extracted items to
//! one or more storages, and re-queues the follow-up requests the handler
//! produces until the crawl times out, runs out of work, or is stopped.

pub mod config;
pub mod crawler;
pub mod handler;
pub mod http;
pub mod storage;

use thiserror::Error;

/// Main error type for Driftnet operations
#[derive(Debug, Error)]
pub enum DriftnetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
///
/// These are the only errors a caller ever sees from the engine: they are
/// raised while building a [`crawler::Spider`] or loading a config file, never
/// once a crawl is running.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("No handler specified")]
    MissingHandler,

    #[error("No storage specified")]
    NoStorage,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Result type alias for Driftnet operations
pub type Result<T> = std::result::Result<T, DriftnetError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Progress, Spider, SpiderHandle, SpiderOptions, StopReason};
pub use handler::{Handler, Item, Outcome};
pub use http::{FetchedPage, Request, Response, TransportError};
pub use storage::{ConsoleStorage, FileStorage, SqliteStorage, Storage, StorageError};

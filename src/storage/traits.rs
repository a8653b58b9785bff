//! Storage traits and error types
//!
//! This module defines the trait interface for item storages and the
//! associated error types.

use crate::handler::Item;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A named destination for crawled items
///
/// `put` is called once per (item, storage) pair from many dispatch tasks at
/// once, so implementations must tolerate concurrent calls. A failed `put` is
/// logged by the spider and never retried.
pub trait Storage: Send + Sync {
    /// Name used in log lines
    fn name(&self) -> &str;

    /// Stores one item
    fn put(&self, item: &dyn Item) -> StorageResult<()>;
}

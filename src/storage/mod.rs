//! Storage module for persisting crawled items
//!
//! This module holds the `Storage` trait the spider writes items through and
//! three implementations:
//! - `ConsoleStorage`: one line per item on stdout
//! - `FileStorage`: one line per item appended to a file
//! - `SqliteStorage`: one row per item in a SQLite database

mod console;
mod file;
mod schema;
mod sqlite;
mod traits;

pub use console::ConsoleStorage;
pub use file::FileStorage;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

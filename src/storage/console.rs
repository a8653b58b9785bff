//! Console storage: one item per line on stdout

use crate::handler::Item;
use crate::storage::traits::{Storage, StorageResult};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

const CONSOLE_STORAGE_NAME: &str = "Console";

/// Writes each item's content as a line to a writer, stdout by default
pub struct ConsoleStorage<W = io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleStorage {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> ConsoleStorage<W> {
    /// Writes to `out` instead of stdout
    pub fn with_writer(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consumes the storage and returns its writer
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Storage for ConsoleStorage<W> {
    fn name(&self) -> &str {
        CONSOLE_STORAGE_NAME
    }

    fn put(&self, item: &dyn Item) -> StorageResult<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{}", item.content())?;
        out.flush()?;
        Ok(())
    }
}

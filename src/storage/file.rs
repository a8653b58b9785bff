//! File storage: appends one item per line to a file

use crate::handler::Item;
use crate::storage::traits::{Storage, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

const FILE_STORAGE_NAME: &str = "File";

/// Appends each item's content followed by a newline to a file
pub struct FileStorage {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileStorage {
    /// Opens `path` for appending, creating it if needed
    ///
    /// New files are created readable and writable by the owner only.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(path)?;

        tracing::debug!("Opened file storage at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn name(&self) -> &str {
        FILE_STORAGE_NAME
    }

    fn put(&self, item: &dyn Item) -> StorageResult<()> {
        let mut line = item.content();
        line.push('\n');

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

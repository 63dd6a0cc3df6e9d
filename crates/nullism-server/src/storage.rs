//! Flat-file persistence for scalar counters.
//!
//! Each counter lives in its own file holding a single decimal integer.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A file holding one `u64`.
#[derive(Debug, Clone)]
pub struct ScalarFile {
    path: PathBuf,
}

impl ScalarFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored value. `Ok(None)` when the file does not exist.
    pub async fn load(&self) -> Result<Option<u64>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        raw.trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Storage(format!("{}: {raw:?}: {e}", self.path.display())))
    }

    /// Read the stored value, treating anything unreadable as `0`.
    pub async fn load_or_default(&self) -> u64 {
        match self.load().await {
            Ok(value) => value.unwrap_or(0),
            Err(e) => {
                let path = self.path.display();
                tracing::warn!(%path, "Error reading counter, using 0: {}", e);
                0
            }
        }
    }

    /// Overwrite the stored value.
    pub async fn store(&self, value: u64) -> Result<()> {
        tokio::fs::write(&self.path, value.to_string()).await?;
        Ok(())
    }

    /// Resolve the start-up value and make sure it is on disk.
    ///
    /// An override wins and is written through. Otherwise the stored value
    /// is used, and a missing file is created with it. Write failures here
    /// are logged, not fatal.
    pub async fn initialize(&self, override_value: Option<u64>) -> u64 {
        let exists = tokio::fs::try_exists(&self.path).await.unwrap_or(false);

        let value = match override_value {
            Some(value) => value,
            None => self.load_or_default().await,
        };

        if override_value.is_some() || !exists {
            if let Err(e) = self.store(value).await {
                tracing::error!(path = %self.path.display(), "Error writing counter: {}", e);
            }
        }
        value
    }
}

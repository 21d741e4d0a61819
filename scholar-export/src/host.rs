//! Host facilities used by exports
//!
//! Clipboard access, file saving and printing belong to the embedding
//! application. They are reached through these traits so the export logic
//! stays testable.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Error type returned by host facilities
pub type HostError = Box<dyn std::error::Error + Send + Sync>;

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), HostError>;
}

#[async_trait]
pub trait FileSink: Send + Sync {
    /// Store `bytes` under `filename`, returning where they ended up
    async fn save(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<PathBuf, HostError>;
}

#[async_trait]
pub trait PrintHost: Send + Sync {
    /// Print a standalone HTML document
    async fn print(&self, title: &str, document: &str) -> Result<(), HostError>;
}

/// File sink writing into a directory, created on first use
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn save(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<PathBuf, HostError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), mime_type, size = bytes.len(), "Wrote export file");
        Ok(path)
    }
}

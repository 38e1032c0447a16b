//! Feed Snapshot Export
//!
//! Writes each feed's current snapshot to one JSON file per feed under
//! the data directory, overwritten on every scheduled refresh. Consumed
//! by external tooling (dashboards, offline analysis); the hub itself
//! never reads these back.

use std::path::{Path, PathBuf};

use crate::domain::feed::FeedType;
use crate::domain::market::FeedBatch;

/// Errors from snapshot export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Underlying file i/o failure.
    #[error("snapshot i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be serialized.
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Writes per-feed snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    /// Create a writer rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Io` if the directory cannot be created.
    pub fn new(dir: PathBuf) -> Result<Self, ExportError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Overwrite the feed's snapshot file with the given batch.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` on serialization or write failure.
    pub fn write(&self, feed: FeedType, batch: &FeedBatch) -> Result<(), ExportError> {
        let json = serde_json::to_vec_pretty(batch)?;
        std::fs::write(self.path(feed), json)?;
        Ok(())
    }

    /// Snapshot file path for a feed.
    #[must_use]
    pub fn path(&self, feed: FeedType) -> PathBuf {
        self.dir.join(format!("{}.json", feed.topic()))
    }

    /// The directory snapshots are written under.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Snapshot encoding errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Snapshot JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot binary encoding failed: {0}")]
    Binary(#[from] bincode::Error),

    /// Written by a newer or older format than this build reads
    #[error("Unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

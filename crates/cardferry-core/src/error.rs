//! Error taxonomy for the migration pipeline.
//!
//! Per-card and per-attachment failures never surface here; they are
//! recorded in the export and import reports. These errors are the ones
//! that stop a phase before it starts (bad user map, unreadable export
//! file, board that cannot be listed).

use cardferry_remote::RemoteError;

/// Pipeline-level errors.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("invalid user map: {0}")]
    InvalidUserMap(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to list cards on board {board}: {source}")]
    BoardListing {
        board: String,
        #[source]
        source: RemoteError,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, MigrationError>;

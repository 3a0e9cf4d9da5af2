//! Error types for cardferry-remote

use thiserror::Error;

/// Errors surfaced by any of the three remote collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// The service answered with a non-success status code
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("{service} request failed: {reason}")]
    Transport {
        service: &'static str,
        reason: String,
    },

    /// The response body did not match the expected shape
    #[error("failed to decode {service} response: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },

    /// A referenced object does not exist on the remote side
    #[error("not found: {0}")]
    NotFound(String),

    /// Uploaded bytes do not match what the storage service reports
    #[error("content hash mismatch for {path}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

impl RemoteError {
    /// Name of the service the error came from, when known.
    pub fn service(&self) -> Option<&'static str> {
        match self {
            RemoteError::Status { service, .. }
            | RemoteError::Transport { service, .. }
            | RemoteError::Decode { service, .. } => Some(service),
            RemoteError::NotFound(_) | RemoteError::IntegrityMismatch { .. } => None,
        }
    }
}

/// Result type for remote collaborator calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

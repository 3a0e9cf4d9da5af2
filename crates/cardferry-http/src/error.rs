//! Error types for cardferry-http

use cardferry_remote::RemoteError;
use thiserror::Error;

/// Errors raised while configuring an HTTP client.
///
/// Errors raised by requests themselves are reported as [`RemoteError`].
#[derive(Error, Debug)]
pub enum HttpClientError {
    /// A required environment variable is not set
    #[error("{0} not set")]
    MissingEnv(&'static str),

    /// A configuration value could not be parsed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// reqwest could not build the client (TLS backend, proxy, ...)
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl From<reqwest::Error> for HttpClientError {
    fn from(err: reqwest::Error) -> Self {
        HttpClientError::Build(err.to_string())
    }
}

/// Map a transport-level reqwest failure into the collaborator error.
pub(crate) fn transport(service: &'static str, err: reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        service,
        reason: err.to_string(),
    }
}

pub(crate) fn decode(service: &'static str, err: serde_json::Error) -> RemoteError {
    RemoteError::Decode {
        service,
        reason: err.to_string(),
    }
}

//! Request plumbing shared by the three service clients.

use std::time::Duration;

use cardferry_remote::{RemoteError, RemoteResult};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{decode, transport, HttpClientError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const USER_AGENT: &str = concat!("cardferry/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, HttpClientError> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Parse an optional timeout override, falling back to the default.
pub(crate) fn parse_timeout(raw: Option<String>) -> Result<Duration, HttpClientError> {
    match raw {
        None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| HttpClientError::InvalidConfig(format!("timeout '{v}' is not a number"))),
    }
}

/// Send a request, turning transport failures into `RemoteError::Transport`.
pub(crate) async fn send(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> RemoteResult<reqwest::Response> {
    let response = request.send().await.map_err(|e| transport(service, e))?;
    debug!(service, status = %response.status(), url = %response.url().path(), "response");
    expect_success(service, response).await
}

async fn expect_success(
    service: &'static str,
    response: reqwest::Response,
) -> RemoteResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

/// Send a request and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> RemoteResult<T> {
    let response = send(service, request).await?;
    let bytes = response.bytes().await.map_err(|e| transport(service, e))?;
    serde_json::from_slice(&bytes).map_err(|e| decode(service, e))
}

/// JSON for HTTP header values: every non-ASCII char becomes a `\uXXXX` escape.
pub(crate) fn header_safe_json<T: serde::Serialize>(value: &T) -> RemoteResult<String> {
    let raw = serde_json::to_string(value).map_err(|e| decode("dropbox", e))?;
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

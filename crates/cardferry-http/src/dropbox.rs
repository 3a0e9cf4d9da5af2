//! Dropbox v2 client (storage/sharing side).

use std::time::Duration;

use async_trait::async_trait;
use cardferry_remote::{
    RemoteError, RemoteResult, ShareLink, StorageClient, UploadRequest, UploadedFile,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::HttpClientError;
use crate::http::{build_client, header_safe_json, parse_timeout, send_json};

const SERVICE: &str = "dropbox";

/// Block size Dropbox uses when computing `content_hash`.
const CONTENT_HASH_BLOCK: usize = 4 * 1024 * 1024;

/// Dropbox configuration
#[derive(Debug, Clone)]
pub struct DropboxConfig {
    /// Bearer access token
    pub token: String,
    /// RPC endpoint root
    pub api_base: String,
    /// Content-upload endpoint root
    pub content_base: String,
    pub timeout: Duration,
}

impl DropboxConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: "https://api.dropboxapi.com/2".to_string(),
            content_base: "https://content.dropboxapi.com/2".to_string(),
            timeout: Duration::from_secs(crate::http::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - DROPBOX_TOKEN (required)
    /// - DROPBOX_API_BASE (optional)
    /// - DROPBOX_CONTENT_BASE (optional)
    /// - CARDFERRY_HTTP_TIMEOUT_SECS (optional, default: 60)
    pub fn from_env() -> Result<Self, HttpClientError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HttpClientError> {
        let token = lookup("DROPBOX_TOKEN").ok_or(HttpClientError::MissingEnv("DROPBOX_TOKEN"))?;
        let mut config = Self::new(token);
        if let Some(base) = lookup("DROPBOX_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(base) = lookup("DROPBOX_CONTENT_BASE") {
            config.content_base = base.trim_end_matches('/').to_string();
        }
        config.timeout = parse_timeout(lookup("CARDFERRY_HTTP_TIMEOUT_SECS"))?;
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct ListLinksArg<'a> {
    path: &'a str,
    direct_only: bool,
}

#[derive(Debug, Deserialize)]
struct ListLinksResponse {
    #[serde(default)]
    links: Vec<ShareLink>,
}

/// Dropbox client implementing [`StorageClient`].
pub struct DropboxClient {
    config: DropboxConfig,
    http: reqwest::Client,
}

impl DropboxClient {
    pub fn new(config: DropboxConfig) -> Result<Self, HttpClientError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }

    fn rpc(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/{}", self.config.api_base, endpoint))
            .bearer_auth(&self.config.token)
    }
}

/// Dropbox `content_hash`: SHA-256 over the concatenated SHA-256 digests of
/// each 4 MiB block, hex encoded.
pub fn dropbox_content_hash(contents: &[u8]) -> String {
    let mut overall = Sha256::new();
    for block in contents.chunks(CONTENT_HASH_BLOCK) {
        overall.update(Sha256::digest(block));
    }
    hex::encode(overall.finalize())
}

#[async_trait]
impl StorageClient for DropboxClient {
    async fn upload(&self, request: UploadRequest, contents: Vec<u8>) -> RemoteResult<UploadedFile> {
        let expected = dropbox_content_hash(&contents);
        let arg = header_safe_json(&request)?;
        let http_request = self
            .http
            .post(format!("{}/files/upload", self.config.content_base))
            .bearer_auth(&self.config.token)
            .header("Dropbox-API-Arg", arg)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(contents);

        let uploaded: UploadedFile = send_json(SERVICE, http_request).await?;
        match uploaded.content_hash.as_deref() {
            Some(actual) if actual != expected => {
                warn!(path = %uploaded.canonical_path, "content hash mismatch after upload");
                return Err(RemoteError::IntegrityMismatch {
                    path: uploaded.canonical_path,
                    expected,
                    actual: actual.to_string(),
                });
            }
            _ => {}
        }
        debug!(path = %uploaded.canonical_path, "uploaded");
        Ok(uploaded)
    }

    async fn list_shared_links(&self, path: &str) -> RemoteResult<Vec<ShareLink>> {
        let arg = ListLinksArg {
            path,
            direct_only: true,
        };
        let response: ListLinksResponse =
            send_json(SERVICE, self.rpc("sharing/list_shared_links").json(&arg)).await?;
        Ok(response.links)
    }

    async fn create_shared_link(&self, path: &str) -> RemoteResult<ShareLink> {
        send_json(
            SERVICE,
            self.rpc("sharing/create_shared_link_with_settings")
                .json(&PathArg { path }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_of_empty_input() {
        assert_eq!(
            dropbox_content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_content_hash_single_block() {
        assert_eq!(
            dropbox_content_hash(b"hello"),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn test_content_hash_spans_blocks() {
        let data = vec![7u8; CONTENT_HASH_BLOCK + 1];
        assert_eq!(
            dropbox_content_hash(&data),
            "426f8d9c94c401005b909c58433ddc647b3bf03720af7bb57f0b8c44dc574160"
        );
    }

    #[test]
    fn test_config_requires_token() {
        let err = DropboxConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, HttpClientError::MissingEnv("DROPBOX_TOKEN")));
    }

    #[test]
    fn test_list_links_response_tolerates_missing_links() {
        let parsed: ListLinksResponse =
            serde_json::from_str(r#"{"has_more": false}"#).expect("deserialize");
        assert!(parsed.links.is_empty());
    }
}

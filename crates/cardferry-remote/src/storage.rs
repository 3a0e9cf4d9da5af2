//! Storage/sharing (Dropbox) wire types and the `StorageClient` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;

/// How an upload treats an existing object at the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Add,
    Overwrite,
}

/// Upload parameters. Serializes directly into the `Dropbox-API-Arg` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub path: String,
    pub mode: WriteMode,
    pub autorename: bool,
    pub mute: bool,
    /// Client-modified timestamp, already rendered for the service.
    pub client_modified: String,
}

impl UploadRequest {
    /// Overwrite-in-place upload: no auto-rename, no notifications.
    pub fn overwrite(path: impl Into<String>, client_modified: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: WriteMode::Overwrite,
            autorename: false,
            mute: true,
            client_modified: client_modified.into(),
        }
    }
}

/// Metadata of an uploaded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Path as the service spells it; used for every follow-up call.
    #[serde(rename = "path_display")]
    pub canonical_path: String,
    #[serde(default)]
    pub content_hash: Option<String>,
}

/// A public link to an uploaded object.
///
/// At most one link per canonical path is expected; callers check
/// [`StorageClient::list_shared_links`] before creating one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLink {
    pub url: String,
    #[serde(rename = "path_lower", default)]
    pub canonical_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

/// Write access to the storage service plus link sharing.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Store `contents` at `request.path`.
    async fn upload(&self, request: UploadRequest, contents: Vec<u8>) -> RemoteResult<UploadedFile>;

    /// Existing shared links for exactly `path`.
    async fn list_shared_links(&self, path: &str) -> RemoteResult<Vec<ShareLink>>;

    /// Create a new public link for `path`.
    async fn create_shared_link(&self, path: &str) -> RemoteResult<ShareLink>;
}

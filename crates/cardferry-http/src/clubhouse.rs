//! Clubhouse v3 client (destination side).

use std::time::Duration;

use async_trait::async_trait;
use cardferry_remote::{
    CreateLinkedFile, CreateStory, DestinationClient, LinkedFile, RemoteResult, StoryId,
    StorySummary,
};

use crate::error::HttpClientError;
use crate::http::{build_client, parse_timeout, send, send_json};

const SERVICE: &str = "clubhouse";

/// Clubhouse configuration
#[derive(Debug, Clone)]
pub struct ClubhouseConfig {
    /// API token, sent as `Clubhouse-Token`
    pub token: String,
    /// API root, e.g. `https://api.clubhouse.io/api/v3`
    pub api_base: String,
    pub timeout: Duration,
}

impl ClubhouseConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: "https://api.clubhouse.io/api/v3".to_string(),
            timeout: Duration::from_secs(crate::http::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - CLUBHOUSE_TOKEN (required)
    /// - CLUBHOUSE_API_BASE (optional)
    /// - CARDFERRY_HTTP_TIMEOUT_SECS (optional, default: 60)
    pub fn from_env() -> Result<Self, HttpClientError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HttpClientError> {
        let token =
            lookup("CLUBHOUSE_TOKEN").ok_or(HttpClientError::MissingEnv("CLUBHOUSE_TOKEN"))?;
        let mut config = Self::new(token);
        if let Some(base) = lookup("CLUBHOUSE_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        config.timeout = parse_timeout(lookup("CARDFERRY_HTTP_TIMEOUT_SECS"))?;
        Ok(config)
    }
}

/// Clubhouse client implementing [`DestinationClient`].
pub struct ClubhouseClient {
    config: ClubhouseConfig,
    http: reqwest::Client,
}

impl ClubhouseClient {
    pub fn new(config: ClubhouseConfig) -> Result<Self, HttpClientError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.config.api_base, path))
            .header("Clubhouse-Token", &self.config.token)
    }
}

#[async_trait]
impl DestinationClient for ClubhouseClient {
    async fn list_records(&self, project_id: i64) -> RemoteResult<Vec<StorySummary>> {
        let path = format!("projects/{project_id}/stories");
        send_json(SERVICE, self.request(reqwest::Method::GET, &path)).await
    }

    async fn delete_record(&self, id: StoryId) -> RemoteResult<()> {
        let path = format!("stories/{id}");
        send(SERVICE, self.request(reqwest::Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn create_record(&self, request: &CreateStory) -> RemoteResult<StorySummary> {
        send_json(
            SERVICE,
            self.request(reqwest::Method::POST, "stories").json(request),
        )
        .await
    }

    async fn create_linked_file(&self, request: &CreateLinkedFile) -> RemoteResult<LinkedFile> {
        send_json(
            SERVICE,
            self.request(reqwest::Method::POST, "linked-files")
                .json(request),
        )
        .await
    }
}

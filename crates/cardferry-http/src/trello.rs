//! Trello REST client (source side).

use std::time::Duration;

use async_trait::async_trait;
use cardferry_remote::{
    RawAction, RawAttachment, RawCard, RawChecklist, RemoteResult, SourceClient,
};
use tracing::debug;

use crate::error::{transport, HttpClientError};
use crate::http::{build_client, parse_timeout, send, send_json};

const SERVICE: &str = "trello";

/// Trello configuration
#[derive(Debug, Clone)]
pub struct TrelloConfig {
    /// API root, e.g. `https://api.trello.com/1`
    pub api_base: String,
    /// Application key
    pub key: String,
    /// Member token
    pub token: String,
    pub timeout: Duration,
}

impl TrelloConfig {
    pub fn new(key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: "https://api.trello.com/1".to_string(),
            key: key.into(),
            token: token.into(),
            timeout: Duration::from_secs(crate::http::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - TRELLO_KEY (required)
    /// - TRELLO_TOKEN (required)
    /// - TRELLO_API_BASE (optional)
    /// - CARDFERRY_HTTP_TIMEOUT_SECS (optional, default: 60)
    pub fn from_env() -> Result<Self, HttpClientError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HttpClientError> {
        let key = lookup("TRELLO_KEY").ok_or(HttpClientError::MissingEnv("TRELLO_KEY"))?;
        let token = lookup("TRELLO_TOKEN").ok_or(HttpClientError::MissingEnv("TRELLO_TOKEN"))?;
        let mut config = Self::new(key, token);
        if let Some(base) = lookup("TRELLO_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        config.timeout = parse_timeout(lookup("CARDFERRY_HTTP_TIMEOUT_SECS"))?;
        Ok(config)
    }
}

/// Trello client implementing [`SourceClient`].
pub struct TrelloClient {
    config: TrelloConfig,
    http: reqwest::Client,
}

impl TrelloClient {
    pub fn new(config: TrelloConfig) -> Result<Self, HttpClientError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path)).query(&[
            ("key", self.config.key.as_str()),
            ("token", self.config.token.as_str()),
        ])
    }

    fn oauth_header(&self) -> String {
        format!(
            "OAuth oauth_consumer_key=\"{}\", oauth_token=\"{}\"",
            self.config.key, self.config.token
        )
    }
}

/// Whether an attachment URL is hosted by Trello itself and needs credentials.
pub(crate) fn is_trello_hosted(url: &str) -> bool {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h == "trello.com" || h.ends_with(".trello.com")))
        .unwrap_or(false)
}

#[async_trait]
impl SourceClient for TrelloClient {
    async fn list_cards(&self, board_id: &str) -> RemoteResult<Vec<RawCard>> {
        send_json(SERVICE, self.get(&format!("boards/{board_id}/cards"))).await
    }

    async fn actions(&self, card: &RawCard) -> RemoteResult<Vec<RawAction>> {
        let request = self
            .get(&format!("cards/{}/actions", card.id))
            .query(&[("filter", "commentCard,createCard"), ("limit", "1000")]);
        send_json(SERVICE, request).await
    }

    async fn checklists(&self, card: &RawCard) -> RemoteResult<Vec<RawChecklist>> {
        send_json(SERVICE, self.get(&format!("cards/{}/checklists", card.id))).await
    }

    async fn attachments(&self, card: &RawCard) -> RemoteResult<Vec<RawAttachment>> {
        send_json(SERVICE, self.get(&format!("cards/{}/attachments", card.id))).await
    }

    async fn download(&self, attachment: &RawAttachment) -> RemoteResult<Vec<u8>> {
        let mut request = self.http.get(&attachment.url);
        if is_trello_hosted(&attachment.url) {
            request = request.header(reqwest::header::AUTHORIZATION, self.oauth_header());
        }
        let response = send(SERVICE, request).await?;
        let bytes = response.bytes().await.map_err(|e| transport(SERVICE, e))?;
        debug!(name = %attachment.name, bytes = bytes.len(), "downloaded attachment");
        Ok(bytes.to_vec())
    }
}

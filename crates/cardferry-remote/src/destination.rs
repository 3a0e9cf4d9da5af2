//! Destination-side (Clubhouse) wire types and the `DestinationClient` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;

/// Identifier of a destination story.
pub type StoryId = i64;

/// The subset of a story needed for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySummary {
    pub id: StoryId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    #[default]
    Feature,
    Bug,
    Chore,
}

impl std::fmt::Display for StoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StoryType::Feature => "feature",
            StoryType::Bug => "bug",
            StoryType::Chore => "chore",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for StoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "feature" => Ok(StoryType::Feature),
            "bug" => Ok(StoryType::Bug),
            "chore" => Ok(StoryType::Chore),
            other => Err(format!(
                "unknown story type '{other}' (expected feature, bug or chore)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLabel {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTask {
    pub complete: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateComment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Story creation request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStory {
    pub project_id: i64,
    pub workflow_state_id: i64,
    pub story_type: StoryType,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by_id: Option<String>,
    pub owner_ids: Vec<String>,
    pub follower_ids: Vec<String>,
    pub labels: Vec<CreateLabel>,
    pub tasks: Vec<CreateTask>,
    pub comments: Vec<CreateComment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub file_ids: Vec<i64>,
    pub linked_file_ids: Vec<i64>,
    /// Back-reference to the source record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Linked-file registration body: an externally hosted file attached by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLinkedFile {
    pub name: String,
    /// Storage provider tag, e.g. `"dropbox"`.
    #[serde(rename = "type")]
    pub provider: String,
    pub url: String,
    pub uploader_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedFile {
    pub id: i64,
}

/// Write access to the destination tracking service.
#[async_trait]
pub trait DestinationClient: Send + Sync {
    /// Every story currently in a project.
    async fn list_records(&self, project_id: i64) -> RemoteResult<Vec<StorySummary>>;

    async fn delete_record(&self, id: StoryId) -> RemoteResult<()>;

    async fn create_record(&self, request: &CreateStory) -> RemoteResult<StorySummary>;

    async fn create_linked_file(&self, request: &CreateLinkedFile) -> RemoteResult<LinkedFile>;
}

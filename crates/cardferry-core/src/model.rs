//! Intermediate representation shared by the export and import phases.
//!
//! Field names on the wire follow the export file format (`desc`,
//! `id_creator`, `checklists`, `url`, ...), not the Rust field names.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One source card, normalized.
///
/// `source_url` is the only field safe to correlate across runs; names may
/// collide. `position` is carried verbatim from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Source member id of the creator; empty when unknown.
    #[serde(rename = "id_creator", default)]
    pub creator_id: String,
    /// Source member ids, first occurrence order, no duplicates.
    #[serde(rename = "id_owners", default)]
    pub owner_ids: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(rename = "checklists", default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub position: f64,
    #[serde(rename = "url")]
    pub source_url: String,
    /// Sanitized file name -> public share URL.
    #[serde(default)]
    pub attachments: BTreeMap<String, String>,
}

impl Card {
    /// A card with only a name and source link set.
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            labels: Vec::new(),
            due_date: None,
            creator_id: String::new(),
            owner_ids: Vec::new(),
            created_at: None,
            comments: Vec::new(),
            tasks: Vec::new(),
            position: 0.0,
            source_url: source_url.into(),
            attachments: BTreeMap::new(),
        }
    }
}

/// A checklist item flattened out of its checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub completed: bool,
    /// `"<checklist> - <item>"`
    pub description: String,
}

impl Task {
    pub fn from_checklist_item(checklist: &str, item: &str, completed: bool) -> Self {
        Self {
            completed,
            description: format!("{checklist} - {item}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    #[serde(rename = "id_creator", default)]
    pub author_source_id: String,
    #[serde(rename = "creator_name", default)]
    pub author_display_name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn card_serializes_with_export_field_names() {
        let mut card = Card::new("Fix login bug", "https://trello.com/c/abc");
        card.description = "details".to_string();
        card.tasks.push(Task::from_checklist_item("Checklist", "Tests", true));
        card.attachments
            .insert("a.png".to_string(), "https://dl/a".to_string());

        let value = serde_json::to_value(&card).expect("serialize card");
        for key in [
            "name",
            "desc",
            "labels",
            "due_date",
            "id_creator",
            "id_owners",
            "created_at",
            "comments",
            "checklists",
            "position",
            "url",
            "attachments",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(value["checklists"][0]["description"], "Checklist - Tests");
        assert_eq!(value["url"], "https://trello.com/c/abc");
    }

    #[test]
    fn card_reads_minimal_document() {
        let card: Card = serde_json::from_value(json!({
            "name": "bare",
            "url": "https://trello.com/c/x"
        }))
        .expect("deserialize card");
        assert!(card.tasks.is_empty());
        assert!(card.due_date.is_none());
        assert_eq!(card.position, 0.0);
    }

    #[test]
    fn comment_uses_creator_field_names() {
        let comment = Comment {
            text: "LGTM".to_string(),
            author_source_id: "u1".to_string(),
            author_display_name: "Una".to_string(),
            created_at: None,
        };
        let value = serde_json::to_value(&comment).expect("serialize comment");
        assert_eq!(value["id_creator"], "u1");
        assert_eq!(value["creator_name"], "Una");
    }
}

//! Source-side (Trello) wire types and the `SourceClient` trait.
//!
//! Payloads are deserialized into explicit records. Fields the pipeline can
//! live without are `#[serde(default)]`; unknown action types collapse into
//! [`ActionKind::Other`] instead of failing the whole response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;

/// A card as returned by the board listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
    /// Due date in the source timestamp format, if any.
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub pos: f64,
    #[serde(default)]
    pub short_url: String,
    #[serde(default)]
    pub id_list: String,
    #[serde(default)]
    pub id_members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLabel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Action types the pipeline cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    CreateCard,
    CommentCard,
    #[serde(other)]
    Other,
}

/// One entry of a card's action history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub data: ActionData,
    #[serde(default)]
    pub member_creator: Option<ActionMember>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMember {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
}

impl RawAction {
    /// Comment body, empty when the action carries none.
    pub fn text(&self) -> &str {
        self.data.text.as_deref().unwrap_or("")
    }

    pub fn actor_id(&self) -> &str {
        self.member_creator.as_ref().map_or("", |m| m.id.as_str())
    }

    pub fn actor_name(&self) -> &str {
        self.member_creator
            .as_ref()
            .map_or("", |m| m.full_name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawChecklist {
    pub name: String,
    #[serde(rename = "checkItems", default)]
    pub items: Vec<RawCheckItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCheckItem {
    pub name: String,
    /// `"complete"` or `"incomplete"`; anything else is treated as incomplete.
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttachment {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// Read access to the source tracking service.
///
/// Implementations must be safe to share across concurrently normalized cards.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// List every open card on a board, in board order.
    async fn list_cards(&self, board_id: &str) -> RemoteResult<Vec<RawCard>>;

    /// Action history of a card (creation and comment events).
    async fn actions(&self, card: &RawCard) -> RemoteResult<Vec<RawAction>>;

    /// Checklists attached to a card, in source order.
    async fn checklists(&self, card: &RawCard) -> RemoteResult<Vec<RawChecklist>>;

    /// Attachment metadata for a card, in source order.
    async fn attachments(&self, card: &RawCard) -> RemoteResult<Vec<RawAttachment>>;

    /// Download the raw bytes behind an attachment.
    async fn download(&self, attachment: &RawAttachment) -> RemoteResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_deserializes_from_trello_shape() {
        let json = r#"{
            "id": "c1",
            "name": "Fix login bug",
            "desc": "steps to reproduce",
            "labels": [{"name": "bug", "color": "red"}, {"name": "bug"}],
            "due": "2023-05-01T00:00:00.000Z",
            "pos": 16384.5,
            "shortUrl": "https://trello.com/c/abc",
            "idList": "l1",
            "idMembers": ["u1", "u2"],
            "closed": false
        }"#;
        let card: RawCard = serde_json::from_str(json).expect("deserialize card");
        assert_eq!(card.labels.len(), 2);
        assert_eq!(card.pos, 16384.5);
        assert_eq!(card.short_url, "https://trello.com/c/abc");
        assert_eq!(card.id_members, vec!["u1", "u2"]);
    }

    #[test]
    fn test_card_missing_optional_fields_defaults() {
        let card: RawCard =
            serde_json::from_str(r#"{"id": "c2", "name": "bare"}"#).expect("deserialize card");
        assert!(card.due.is_none());
        assert!(card.labels.is_empty());
        assert_eq!(card.desc, "");
    }

    #[test]
    fn test_unknown_action_type_maps_to_other() {
        let json = r#"{"type": "updateCard", "date": "2023-01-01T00:00:00.000Z", "data": {}}"#;
        let action: RawAction = serde_json::from_str(json).expect("deserialize action");
        assert_eq!(action.kind, ActionKind::Other);
        assert_eq!(action.text(), "");
        assert_eq!(action.actor_id(), "");
    }

    #[test]
    fn test_comment_action_accessors() {
        let json = r#"{
            "type": "commentCard",
            "date": "2023-01-02T10:00:00.000Z",
            "data": {"text": "LGTM"},
            "memberCreator": {"id": "u1", "fullName": "Una One"}
        }"#;
        let action: RawAction = serde_json::from_str(json).expect("deserialize action");
        assert_eq!(action.kind, ActionKind::CommentCard);
        assert_eq!(action.text(), "LGTM");
        assert_eq!(action.actor_id(), "u1");
        assert_eq!(action.actor_name(), "Una One");
    }

    #[test]
    fn test_checklist_items_use_check_items_key() {
        let json = r#"{"name": "Checklist", "checkItems": [{"name": "Tests", "state": "complete"}]}"#;
        let checklist: RawChecklist = serde_json::from_str(json).expect("deserialize checklist");
        assert_eq!(checklist.items.len(), 1);
        assert_eq!(checklist.items[0].state, "complete");
    }
}

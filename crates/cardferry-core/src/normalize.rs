//! Card normalization: one raw source card in, exactly one [`Card`] out.
//!
//! Fetch failures for actions, checklists or attachments never abort the
//! card; the affected field stays empty and the failure is recorded as a
//! [`CardIssue`].

use std::sync::Arc;

use cardferry_remote::{
    ActionKind, RawAction, RawCard, RawChecklist, RawLabel, RemoteError, RemoteResult,
    SourceClient,
};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::model::{Card, Comment, Task};
use crate::obs;
use crate::relocate::{AttachmentRelocator, SkippedAttachment};

/// Timestamp layout used by the source API (`2023-05-01T00:00:00.000Z`).
/// The millisecond fraction is mandatory.
pub const SOURCE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%3fZ";

/// Checklist item state that marks an item done.
pub const COMPLETE_STATE: &str = "complete";

/// Parse a source timestamp; anything malformed is `None`.
pub fn parse_source_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, SOURCE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Label display names in source order, duplicates kept.
pub fn flatten_labels(labels: &[RawLabel]) -> Vec<String> {
    labels.iter().map(|l| l.name.clone()).collect()
}

/// One task per checklist item, in checklist then item order.
pub fn flatten_checklists(checklists: &[RawChecklist]) -> Vec<Task> {
    checklists
        .iter()
        .flat_map(|checklist| {
            checklist.items.iter().map(move |item| {
                Task::from_checklist_item(&checklist.name, &item.name, item.state == COMPLETE_STATE)
            })
        })
        .collect()
}

/// Member ids with duplicates removed, first occurrence kept.
fn unique_in_order(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}

/// What a card's action history says about authorship and discussion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionSummary {
    /// Actor of the last creation event; empty when there was none.
    pub creator_id: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Number of creation events seen.
    pub creation_events: usize,
    /// Non-empty comments in history order.
    pub comments: Vec<Comment>,
}

impl ActionSummary {
    /// Fold an ordered action history. The last creation event wins.
    pub fn fold<'a>(actions: impl IntoIterator<Item = &'a RawAction>) -> Self {
        actions
            .into_iter()
            .fold(Self::default(), |mut acc, action| {
                match action.kind {
                    ActionKind::CommentCard if !action.text().is_empty() => {
                        acc.comments.push(Comment {
                            text: action.text().to_string(),
                            author_source_id: action.actor_id().to_string(),
                            author_display_name: action.actor_name().to_string(),
                            created_at: parse_source_timestamp(&action.date),
                        });
                    }
                    ActionKind::CreateCard => {
                        acc.creator_id = action.actor_id().to_string();
                        acc.created_at = parse_source_timestamp(&action.date);
                        acc.creation_events += 1;
                    }
                    _ => {}
                }
                acc
            })
    }
}

/// Per-card problems that were recovered from.
#[derive(Debug, Clone, PartialEq)]
pub enum CardIssue {
    FetchFailed {
        what: &'static str,
        error: RemoteError,
    },
    AttachmentSkipped(SkippedAttachment),
}

/// A normalized card plus everything that went wrong producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCard {
    pub card: Card,
    pub issues: Vec<CardIssue>,
}

fn fetch_or_empty<T>(
    card: &RawCard,
    what: &'static str,
    result: RemoteResult<Vec<T>>,
    issues: &mut Vec<CardIssue>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(error) => {
            obs::emit_fetch_failed(&card.short_url, what, &error);
            issues.push(CardIssue::FetchFailed { what, error });
            Vec::new()
        }
    }
}

/// Turns raw source cards into [`Card`]s.
pub struct CardNormalizer {
    source: Arc<dyn SourceClient>,
    relocator: Option<AttachmentRelocator>,
}

impl CardNormalizer {
    pub fn new(source: Arc<dyn SourceClient>) -> Self {
        Self {
            source,
            relocator: None,
        }
    }

    /// Relocate attachments while normalizing.
    pub fn with_relocator(mut self, relocator: AttachmentRelocator) -> Self {
        self.relocator = Some(relocator);
        self
    }

    pub async fn normalize(&self, raw: &RawCard) -> NormalizedCard {
        let mut issues = Vec::new();

        let actions = self.source.actions(raw).await;
        let actions = fetch_or_empty(raw, "actions", actions, &mut issues);
        let summary = ActionSummary::fold(&actions);
        if summary.creation_events == 0 {
            obs::emit_creator_unknown(&raw.short_url);
        }

        let checklists = self.source.checklists(raw).await;
        let checklists = fetch_or_empty(raw, "checklists", checklists, &mut issues);

        let mut card = Card::new(raw.name.clone(), raw.short_url.clone());
        card.description = raw.desc.clone();
        card.labels = flatten_labels(&raw.labels);
        card.due_date = raw.due.as_deref().and_then(parse_source_timestamp);
        card.creator_id = summary.creator_id;
        card.created_at = summary.created_at;
        card.owner_ids = unique_in_order(&raw.id_members);
        card.comments = summary.comments;
        card.tasks = flatten_checklists(&checklists);
        card.position = raw.pos;

        if let Some(relocator) = &self.relocator {
            let attachments = self.source.attachments(raw).await;
            let attachments = fetch_or_empty(raw, "attachments", attachments, &mut issues);
            let report = relocator.relocate(raw, &attachments).await;
            card.attachments = report.links;
            issues.extend(report.skipped.into_iter().map(CardIssue::AttachmentSkipped));
        }

        obs::emit_card_normalized(
            &card.source_url,
            card.tasks.len(),
            card.comments.len(),
            card.attachments.len(),
        );
        NormalizedCard { card, issues }
    }
}

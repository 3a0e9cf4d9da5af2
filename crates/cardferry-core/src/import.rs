//! Import orchestration: one destination story per normalized card.
//!
//! Per card the orchestrator walks
//! `Pending -> DuplicateCheck -> (Deleted | NoMatch) -> Submitted -> (Success | Failed)`.
//! Nothing that goes wrong for one card stops the batch.

use std::sync::Arc;

use cardferry_remote::{
    CreateComment, CreateLabel, CreateLinkedFile, CreateStory, CreateTask, DestinationClient,
    RemoteError, StoryId, StorySummary,
};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::ImportConfig;
use crate::lock::ProjectLocks;
use crate::model::Card;
use crate::obs;
use crate::user_map::UserMap;

/// Column layout of the status table.
pub const STATUS_HEADER: (&str, &str, &str) =
    ("Trello Card Link", "Import Status", "Error/Story ID");

/// Text of the optional trailing comment linking back to the source card.
pub fn source_link_comment(source_url: &str) -> String {
    format!("Card imported from Trello: {source_url}")
}

/// Render one row of the status table.
pub fn format_status_line(link: &str, status: &str, detail: &str) -> String {
    format!("{:<40} {:<17} {}", link, status, detail)
}

/// Per-card state machine positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Pending,
    DuplicateCheck,
    Deleted,
    NoMatch,
    Submitted,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportStatus {
    Success { story_id: StoryId },
    Failed { error: RemoteError },
}

/// Everything that happened to one card during import.
#[derive(Debug, Clone, PartialEq)]
pub struct CardOutcome {
    pub source_url: String,
    pub name: String,
    /// States visited, in order; ends in `Success` or `Failed`.
    pub trail: Vec<CardState>,
    pub deleted: Vec<StoryId>,
    pub failed_deletes: Vec<(StoryId, RemoteError)>,
    pub linked_files: Vec<i64>,
    /// File names whose linked-file registration failed.
    pub skipped_files: Vec<String>,
    pub status: ImportStatus,
}

impl CardOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ImportStatus::Success { .. })
    }

    pub fn state(&self) -> CardState {
        if self.is_success() {
            CardState::Success
        } else {
            CardState::Failed
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_success() {
            "Success"
        } else {
            "Failed"
        }
    }

    /// New story id on success, the error otherwise.
    pub fn detail(&self) -> String {
        match &self.status {
            ImportStatus::Success { story_id } => format!("Story ID: {story_id}"),
            ImportStatus::Failed { error } => error.to_string(),
        }
    }

    pub fn status_line(&self) -> String {
        format_status_line(&self.source_url, self.status_label(), &self.detail())
    }
}

/// Outcomes of one import batch, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub outcomes: Vec<CardOutcome>,
}

impl ImportReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Build the story creation request for a card.
///
/// Unmapped or unknown creators fall back to the importing member.
/// Unmapped owners are dropped; unmapped comment authors are left unset.
pub fn build_story(
    card: &Card,
    config: &ImportConfig,
    users: &UserMap,
    linked_file_ids: Vec<i64>,
    imported_at: DateTime<Utc>,
) -> CreateStory {
    let requested_by_id = users
        .resolve(&card.creator_id)
        .unwrap_or(config.import_member_id.as_str())
        .to_string();

    let mut owner_ids: Vec<String> = Vec::new();
    for source_id in &card.owner_ids {
        match users.resolve(source_id) {
            Some(id) if !owner_ids.iter().any(|o| o == id) => owner_ids.push(id.to_string()),
            Some(_) => {}
            None => debug!(card = %card.source_url, member = %source_id, "owner not in user map"),
        }
    }

    let mut comments: Vec<CreateComment> = card
        .comments
        .iter()
        .map(|c| CreateComment {
            text: c.text.clone(),
            author_id: users.resolve(&c.author_source_id).map(str::to_string),
            created_at: c.created_at,
        })
        .collect();
    if config.add_source_link_comment {
        comments.push(CreateComment {
            text: source_link_comment(&card.source_url),
            author_id: None,
            created_at: Some(imported_at),
        });
    }

    CreateStory {
        project_id: config.project_id,
        workflow_state_id: config.workflow_state_id,
        story_type: config.story_type,
        name: card.name.clone(),
        description: card.description.clone(),
        requested_by_id: Some(requested_by_id),
        owner_ids,
        follower_ids: Vec::new(),
        labels: card
            .labels
            .iter()
            .map(|name| CreateLabel { name: name.clone() })
            .collect(),
        tasks: card
            .tasks
            .iter()
            .map(|t| CreateTask {
                complete: t.completed,
                description: t.description.clone(),
            })
            .collect(),
        comments,
        deadline: card.due_date,
        created_at: card.created_at,
        file_ids: Vec::new(),
        linked_file_ids,
        external_id: (!card.source_url.is_empty()).then(|| card.source_url.clone()),
    }
}

/// Creates destination stories from normalized cards.
pub struct ImportOrchestrator {
    destination: Arc<dyn DestinationClient>,
    users: Arc<UserMap>,
    config: ImportConfig,
    locks: ProjectLocks,
}

impl ImportOrchestrator {
    pub fn new(
        destination: Arc<dyn DestinationClient>,
        users: Arc<UserMap>,
        config: ImportConfig,
    ) -> Self {
        Self {
            destination,
            users,
            config,
            locks: ProjectLocks::new(),
        }
    }

    /// Share a lock table with other orchestrators targeting the same service.
    pub fn with_locks(mut self, locks: ProjectLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub async fn import(&self, cards: &[Card]) -> ImportReport {
        self.import_with(cards, |_| {}).await
    }

    /// Import `cards` in order, calling `on_outcome` as each card finishes.
    ///
    /// The project lock is held for the whole batch, from the snapshot
    /// listing to the last creation.
    pub async fn import_with<F>(&self, cards: &[Card], mut on_outcome: F) -> ImportReport
    where
        F: FnMut(&CardOutcome),
    {
        let _guard = self.locks.lock(self.config.project_id).await;

        let mut snapshot = match self.destination.list_records(self.config.project_id).await {
            Ok(stories) => stories,
            Err(error) => {
                obs::emit_snapshot_failed(self.config.project_id, &error);
                Vec::new()
            }
        };

        let mut report = ImportReport::default();
        for card in cards {
            let outcome = self.import_card(card, &mut snapshot).await;
            on_outcome(&outcome);
            report.outcomes.push(outcome);
        }
        obs::emit_phase_finished("import", report.outcomes.len(), report.failed());
        report
    }

    async fn import_card(&self, card: &Card, snapshot: &mut Vec<StorySummary>) -> CardOutcome {
        let mut trail = vec![CardState::Pending, CardState::DuplicateCheck];
        let (deleted, failed_deletes) = self.delete_matching(card, snapshot).await;
        trail.push(if deleted.is_empty() && failed_deletes.is_empty() {
            CardState::NoMatch
        } else {
            CardState::Deleted
        });

        let (linked_files, skipped_files) = self.register_linked_files(card).await;
        let request = build_story(
            card,
            &self.config,
            &self.users,
            linked_files.clone(),
            Utc::now(),
        );

        trail.push(CardState::Submitted);
        let status = match self.destination.create_record(&request).await {
            Ok(story) => {
                obs::emit_card_imported(&card.source_url, story.id);
                let story_id = story.id;
                snapshot.push(story);
                ImportStatus::Success { story_id }
            }
            Err(error) => {
                obs::emit_card_failed(&card.source_url, &error);
                ImportStatus::Failed { error }
            }
        };

        let mut outcome = CardOutcome {
            source_url: card.source_url.clone(),
            name: card.name.clone(),
            trail,
            deleted,
            failed_deletes,
            linked_files,
            skipped_files,
            status,
        };
        outcome.trail.push(outcome.state());
        outcome
    }

    /// Delete every snapshot story named exactly like the card.
    async fn delete_matching(
        &self,
        card: &Card,
        snapshot: &mut Vec<StorySummary>,
    ) -> (Vec<StoryId>, Vec<(StoryId, RemoteError)>) {
        let matching: Vec<StoryId> = snapshot
            .iter()
            .filter(|s| s.name == card.name)
            .map(|s| s.id)
            .collect();

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for id in matching {
            match self.destination.delete_record(id).await {
                Ok(()) => {
                    obs::emit_record_deleted(&card.source_url, id);
                    deleted.push(id);
                }
                Err(error) => {
                    obs::emit_record_delete_failed(&card.source_url, id, &error);
                    failed.push((id, error));
                }
            }
        }
        snapshot.retain(|s| !deleted.contains(&s.id));
        (deleted, failed)
    }

    async fn register_linked_files(&self, card: &Card) -> (Vec<i64>, Vec<String>) {
        let mut ids = Vec::new();
        let mut skipped = Vec::new();
        for (name, url) in &card.attachments {
            let request = CreateLinkedFile {
                name: name.clone(),
                provider: self.config.storage_provider.clone(),
                url: url.clone(),
                uploader_id: self.config.import_member_id.clone(),
            };
            match self.destination.create_linked_file(&request).await {
                Ok(file) => ids.push(file.id),
                Err(error) => {
                    obs::emit_linked_file_failed(&card.source_url, name, url, &error);
                    skipped.push(name.clone());
                }
            }
        }
        (ids, skipped)
    }
}

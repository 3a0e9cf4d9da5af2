//! Structured observability hooks for migration lifecycle events.
//!
//! Every event carries an `event = "..."` field so log pipelines can filter
//! on it. Per-card events are keyed by the card's source URL.

use cardferry_remote::RemoteError;
use tracing::{debug, info, warn};

/// RAII guard that enters a run-scoped span for the duration of a phase.
///
/// ```ignore
/// let _span = MigrationSpan::enter("export", &run_id);
/// // all events below carry phase = "export" and run_id
/// ```
pub struct MigrationSpan {
    _span: tracing::span::EnteredSpan,
}

impl MigrationSpan {
    pub fn enter(phase: &str, run_id: &str) -> Self {
        let span = tracing::info_span!("cardferry.run", phase = %phase, run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Fresh identifier correlating every event of one CLI invocation.
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A sub-resource of a card could not be fetched; it defaults to empty.
pub fn emit_fetch_failed(card_url: &str, what: &str, error: &RemoteError) {
    warn!(event = "card.fetch_failed", card = %card_url, what = %what, error = %error);
}

pub fn emit_card_normalized(card_url: &str, tasks: usize, comments: usize, attachments: usize) {
    info!(
        event = "card.normalized",
        card = %card_url,
        tasks = tasks,
        comments = comments,
        attachments = attachments,
    );
}

/// No creation event was found in the card's history.
pub fn emit_creator_unknown(card_url: &str) {
    debug!(event = "card.creator_unknown", card = %card_url);
}

pub fn emit_attachment_relocated(card_url: &str, name: &str, url: &str, reused_link: bool) {
    info!(
        event = "attachment.relocated",
        card = %card_url,
        name = %name,
        url = %url,
        reused_link = reused_link,
    );
}

pub fn emit_attachment_skipped(card_url: &str, name: &str, stage: &str, error: &RemoteError) {
    warn!(
        event = "attachment.skipped",
        card = %card_url,
        name = %name,
        stage = %stage,
        error = %error,
    );
}

pub fn emit_snapshot_failed(project_id: i64, error: &RemoteError) {
    warn!(event = "import.snapshot_failed", project_id = project_id, error = %error);
}

pub fn emit_record_deleted(card_url: &str, story_id: i64) {
    info!(event = "story.deleted", card = %card_url, story_id = story_id);
}

pub fn emit_record_delete_failed(card_url: &str, story_id: i64, error: &RemoteError) {
    warn!(
        event = "story.delete_failed",
        card = %card_url,
        story_id = story_id,
        error = %error,
    );
}

pub fn emit_linked_file_failed(card_url: &str, name: &str, url: &str, error: &RemoteError) {
    warn!(
        event = "linked_file.failed",
        card = %card_url,
        name = %name,
        url = %url,
        error = %error,
    );
}

pub fn emit_card_imported(card_url: &str, story_id: i64) {
    info!(event = "card.imported", card = %card_url, story_id = story_id);
}

pub fn emit_card_failed(card_url: &str, error: &RemoteError) {
    warn!(event = "card.import_failed", card = %card_url, error = %error);
}

pub fn emit_phase_finished(phase: &str, total: usize, failed: usize) {
    info!(event = "phase.finished", phase = %phase, total = total, failed = failed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_span_enter() {
        let _span = MigrationSpan::enter("export", "run-1");
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(new_run_id(), new_run_id());
    }
}

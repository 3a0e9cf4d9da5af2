//! Import orchestration against the in-memory destination.

use std::sync::Arc;

use cardferry_core::{
    Card, CardState, Comment, ImportConfig, ImportOrchestrator, ImportStatus, ProjectLocks,
    UserMap,
};
use cardferry_remote::fakes::MemoryDestination;

const PROJECT: i64 = 42;

fn config() -> ImportConfig {
    ImportConfig::new(PROJECT, 500_001, "importer-1")
}

fn users() -> Arc<UserMap> {
    Arc::new(UserMap::from_pairs([("u1", "dest-1"), ("u2", "dest-2")]).expect("user map"))
}

fn card(name: &str, slug: &str) -> Card {
    Card::new(name, format!("https://trello.com/c/{slug}"))
}

fn orchestrator(destination: &Arc<MemoryDestination>) -> ImportOrchestrator {
    ImportOrchestrator::new(destination.clone(), users(), config())
}

#[tokio::test]
async fn rerun_leaves_one_story_per_name() {
    let destination = Arc::new(MemoryDestination::new());
    let cards = vec![card("Fix login bug", "a"), card("Write docs", "b")];

    let first = orchestrator(&destination).import(&cards).await;
    let second = orchestrator(&destination).import(&cards).await;

    assert!(first.all_succeeded());
    assert!(second.all_succeeded());
    assert_eq!(destination.stories_named("Fix login bug").len(), 1);
    assert_eq!(destination.stories_named("Write docs").len(), 1);
    assert_eq!(destination.deleted().len(), 2);
    assert_eq!(
        second.outcomes[0].trail,
        vec![
            CardState::Pending,
            CardState::DuplicateCheck,
            CardState::Deleted,
            CardState::Submitted,
            CardState::Success,
        ]
    );
}

#[tokio::test]
async fn snapshot_is_listed_once_per_batch() {
    let destination = Arc::new(MemoryDestination::new());
    let cards = vec![card("One", "1"), card("Two", "2"), card("Three", "3")];

    orchestrator(&destination).import(&cards).await;

    assert_eq!(destination.list_calls(), 1);
}

#[tokio::test]
async fn same_name_twice_in_one_batch_keeps_the_later_card() {
    let destination = Arc::new(MemoryDestination::new());
    let cards = vec![card("Duplicate", "first"), card("Duplicate", "second")];

    let report = orchestrator(&destination).import(&cards).await;

    let stories = destination.stories_named("Duplicate");
    assert_eq!(stories.len(), 1);
    assert_eq!(
        stories[0].request.external_id.as_deref(),
        Some("https://trello.com/c/second")
    );
    assert_eq!(report.outcomes[1].deleted.len(), 1);
}

#[tokio::test]
async fn only_exact_name_matches_are_deleted() {
    let destination = Arc::new(MemoryDestination::new());
    let keep = destination.seed(PROJECT, "fix login bug");
    let other_project = destination.seed(7, "Fix login bug");

    let report = orchestrator(&destination)
        .import(&[card("Fix login bug", "a")])
        .await;

    assert!(report.outcomes[0].deleted.is_empty());
    assert!(report.outcomes[0].trail.contains(&CardState::NoMatch));
    let remaining: Vec<_> = destination.stories().iter().map(|s| s.id).collect();
    assert!(remaining.contains(&keep));
    assert!(remaining.contains(&other_project));
}

#[tokio::test]
async fn delete_failure_still_creates_the_story() {
    let destination = Arc::new(MemoryDestination::new());
    let stale = destination.seed(PROJECT, "Stale");
    destination.fail_delete(stale);

    let report = orchestrator(&destination).import(&[card("Stale", "s")]).await;

    let outcome = &report.outcomes[0];
    assert!(outcome.is_success());
    assert_eq!(outcome.failed_deletes.len(), 1);
    assert_eq!(outcome.failed_deletes[0].0, stale);
    assert!(outcome.deleted.is_empty());
    assert!(outcome.trail.contains(&CardState::Deleted));
    assert!(!outcome.trail.contains(&CardState::NoMatch));
    assert_eq!(destination.stories_named("Stale").len(), 2);
}

#[tokio::test]
async fn snapshot_failure_treats_project_as_empty() {
    let destination = Arc::new(MemoryDestination::new());
    destination.seed(PROJECT, "Existing");
    destination.fail_listing(true);

    let report = orchestrator(&destination)
        .import(&[card("Existing", "e")])
        .await;

    assert!(report.all_succeeded());
    assert!(destination.deleted().is_empty());
    assert_eq!(destination.stories_named("Existing").len(), 2);
}

#[tokio::test]
async fn linked_file_failure_omits_only_that_file() {
    let destination = Arc::new(MemoryDestination::new());
    let mut with_files = card("With files", "f");
    with_files
        .attachments
        .insert("a.png".to_string(), "https://dl/a".to_string());
    with_files
        .attachments
        .insert("b.png".to_string(), "https://dl/b".to_string());
    destination.fail_linked_file("https://dl/b");

    let report = orchestrator(&destination).import(&[with_files]).await;

    let outcome = &report.outcomes[0];
    assert!(outcome.is_success());
    assert_eq!(outcome.skipped_files, vec!["b.png"]);
    let linked = destination.linked_files();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].1.name, "a.png");
    assert_eq!(linked[0].1.provider, "dropbox");
    assert_eq!(linked[0].1.uploader_id, "importer-1");

    let story = &destination.stories_named("With files")[0];
    assert_eq!(story.request.linked_file_ids, vec![linked[0].0]);
}

#[tokio::test]
async fn create_failure_is_reported_and_batch_continues() {
    let destination = Arc::new(MemoryDestination::new());
    destination.fail_create("Rejected");
    let cards = vec![card("Rejected", "r"), card("Accepted", "ok")];

    let mut lines = Vec::new();
    let report = orchestrator(&destination)
        .import_with(&cards, |outcome| lines.push(outcome.status_line()))
        .await;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 1);
    assert!(!report.all_succeeded());
    assert!(matches!(
        report.outcomes[0].status,
        ImportStatus::Failed { .. }
    ));
    assert_eq!(report.outcomes[0].trail.last(), Some(&CardState::Failed));

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("https://trello.com/c/r"));
    assert!(lines[0].contains("Failed"));
    assert!(lines[0].contains("create story 'Rejected'"));
    assert!(lines[1].contains("Success"));
    assert!(lines[1].contains("Story ID: "));
}

#[tokio::test]
async fn identities_are_mapped_into_the_request() {
    let destination = Arc::new(MemoryDestination::new());
    let mut mapped = card("Mapped", "m");
    mapped.creator_id = "u1".to_string();
    mapped.owner_ids = vec!["u2".to_string(), "stranger".to_string()];
    mapped.comments.push(Comment {
        text: "LGTM".to_string(),
        author_source_id: "u2".to_string(),
        author_display_name: "Second".to_string(),
        created_at: None,
    });
    let mut orphan = card("Orphan", "o");
    orphan.creator_id = "stranger".to_string();

    orchestrator(&destination).import(&[mapped, orphan]).await;

    let mapped = &destination.stories_named("Mapped")[0].request;
    assert_eq!(mapped.requested_by_id.as_deref(), Some("dest-1"));
    assert_eq!(mapped.owner_ids, vec!["dest-2"]);
    assert_eq!(mapped.comments[0].author_id.as_deref(), Some("dest-2"));
    assert_eq!(mapped.project_id, PROJECT);
    assert_eq!(mapped.workflow_state_id, 500_001);

    let orphan = &destination.stories_named("Orphan")[0].request;
    assert_eq!(orphan.requested_by_id.as_deref(), Some("importer-1"));
}

#[tokio::test]
async fn source_link_comment_is_optional() {
    let destination = Arc::new(MemoryDestination::new());
    let linked = ImportOrchestrator::new(
        destination.clone(),
        users(),
        config().with_source_link_comment(true),
    );

    linked.import(&[card("Linked", "l")]).await;
    orchestrator(&destination).import(&[card("Plain", "p")]).await;

    let linked = &destination.stories_named("Linked")[0].request;
    assert_eq!(linked.comments.len(), 1);
    assert_eq!(
        linked.comments[0].text,
        "Card imported from Trello: https://trello.com/c/l"
    );
    assert!(linked.comments[0].created_at.is_some());
    assert!(destination.stories_named("Plain")[0]
        .request
        .comments
        .is_empty());
}

#[tokio::test]
async fn concurrent_imports_into_one_project_do_not_duplicate() {
    let destination = Arc::new(MemoryDestination::new());
    let locks = ProjectLocks::new();
    let a = orchestrator(&destination).with_locks(locks.clone());
    let b = orchestrator(&destination).with_locks(locks);
    let cards = vec![card("Shared", "s")];

    let (ra, rb) = tokio::join!(a.import(&cards), b.import(&cards));

    assert!(ra.all_succeeded() && rb.all_succeeded());
    assert_eq!(destination.stories_named("Shared").len(), 1);
}

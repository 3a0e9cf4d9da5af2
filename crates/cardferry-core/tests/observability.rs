//! Structured tracing events for the migration lifecycle.

use cardferry_core::obs::{
    emit_attachment_relocated, emit_attachment_skipped, emit_card_failed, emit_card_imported,
    emit_card_normalized, emit_creator_unknown, emit_fetch_failed, emit_linked_file_failed,
    emit_phase_finished, emit_record_delete_failed, emit_record_deleted, emit_snapshot_failed,
};
use cardferry_core::MigrationSpan;
use cardferry_remote::RemoteError;
use tracing_test::traced_test;

fn server_error() -> RemoteError {
    RemoteError::Status {
        service: "clubhouse",
        status: 503,
        body: "maintenance".to_string(),
    }
}

#[traced_test]
#[test]
fn test_card_normalized_logs_counts() {
    emit_card_normalized("https://trello.com/c/abc", 2, 1, 0);
    assert!(logs_contain("card.normalized"));
    assert!(logs_contain("tasks=2"));
}

#[traced_test]
#[test]
fn test_fetch_failed_logs_what_and_error() {
    emit_fetch_failed("https://trello.com/c/abc", "checklists", &server_error());
    assert!(logs_contain("card.fetch_failed"));
    assert!(logs_contain("checklists"));
    assert!(logs_contain("maintenance"));
}

#[traced_test]
#[test]
fn test_creator_unknown_is_logged() {
    emit_creator_unknown("https://trello.com/c/old");
    assert!(logs_contain("card.creator_unknown"));
}

#[traced_test]
#[test]
fn test_attachment_events() {
    emit_attachment_relocated(
        "https://trello.com/c/abc",
        "a.png",
        "https://www.dropbox.com/s/x/a.png?dl=0",
        true,
    );
    emit_attachment_skipped(
        "https://trello.com/c/abc",
        "b.png",
        "upload",
        &server_error(),
    );
    assert!(logs_contain("attachment.relocated"));
    assert!(logs_contain("reused_link=true"));
    assert!(logs_contain("attachment.skipped"));
}

#[traced_test]
#[test]
fn test_import_events() {
    emit_snapshot_failed(42, &server_error());
    emit_record_deleted("https://trello.com/c/abc", 7);
    emit_record_delete_failed("https://trello.com/c/abc", 8, &server_error());
    emit_linked_file_failed(
        "https://trello.com/c/abc",
        "a.png",
        "https://dl/a",
        &server_error(),
    );
    emit_card_imported("https://trello.com/c/abc", 9);
    emit_card_failed("https://trello.com/c/def", &server_error());
    emit_phase_finished("import", 2, 1);

    for event in [
        "import.snapshot_failed",
        "story.deleted",
        "story.delete_failed",
        "linked_file.failed",
        "card.imported",
        "card.import_failed",
        "phase.finished",
    ] {
        assert!(logs_contain(event), "missing {event}");
    }
}

#[traced_test]
#[test]
fn test_migration_span_scopes_events() {
    {
        let _span = MigrationSpan::enter("import", "run-span-1");
        emit_card_imported("https://trello.com/c/abc", 1);
    }
    assert!(logs_contain("run-span-1"));
}

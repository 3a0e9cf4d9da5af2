//! Attachment relocation against in-memory source and storage.

use std::sync::Arc;

use cardferry_core::{AttachmentRelocator, RelocationStage, RelocatorConfig};
use cardferry_remote::fakes::{MemorySource, MemoryStorage};
use cardferry_remote::{RawAttachment, RawCard};

fn card() -> RawCard {
    RawCard {
        id: "card-9".to_string(),
        name: "Design review".to_string(),
        short_url: "https://trello.com/c/xyz".to_string(),
        id_list: "list-2".to_string(),
        ..RawCard::default()
    }
}

fn attachment(name: &str) -> RawAttachment {
    RawAttachment {
        name: name.to_string(),
        url: format!("https://files.example.com/{name}"),
        ..RawAttachment::default()
    }
}

fn source_with(names: &[&str]) -> MemorySource {
    names.iter().fold(MemorySource::new(), |source, name| {
        source.with_blob(&format!("https://files.example.com/{name}"), name.as_bytes())
    })
}

#[tokio::test]
async fn second_run_reuses_the_existing_link() {
    let source = Arc::new(source_with(&["brief.pdf"]));
    let storage = Arc::new(MemoryStorage::new());
    let relocator = AttachmentRelocator::new(source, storage.clone(), RelocatorConfig::default());
    let attachments = [attachment("brief.pdf")];

    let first = relocator.relocate(&card(), &attachments).await;
    let second = relocator.relocate(&card(), &attachments).await;

    assert_eq!(first.links, second.links);
    assert_eq!(storage.links_created(), 1);
    assert_eq!(storage.upload_count(), 2);
    assert_eq!(storage.file_count(), 1);
}

#[tokio::test]
async fn files_land_under_the_configured_root() {
    let source = Arc::new(source_with(&["notes.txt"]));
    let storage = Arc::new(MemoryStorage::new());
    let relocator = AttachmentRelocator::new(
        source,
        storage.clone(),
        RelocatorConfig::default().with_root("/archive/"),
    );

    relocator.relocate(&card(), &[attachment("notes.txt")]).await;

    assert!(storage.file("/archive/list-2/card-9/0_notes.txt").is_some());
}

#[tokio::test]
async fn download_failure_skips_only_that_attachment() {
    let source = Arc::new(source_with(&["b.png"]));
    let storage = Arc::new(MemoryStorage::new());
    let relocator = AttachmentRelocator::new(source, storage, RelocatorConfig::default());

    let report = relocator
        .relocate(&card(), &[attachment("a.png"), attachment("b.png")])
        .await;

    assert_eq!(report.links.keys().collect::<Vec<_>>(), vec!["b.png"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 0);
    assert_eq!(report.skipped[0].stage, RelocationStage::Download);
}

#[tokio::test]
async fn upload_failure_skips_only_that_attachment() {
    let source = Arc::new(source_with(&["a.png", "b.png"]));
    let storage = Arc::new(MemoryStorage::new());
    storage.fail_upload("0_a.png");
    let relocator = AttachmentRelocator::new(source, storage.clone(), RelocatorConfig::default());

    let report = relocator
        .relocate(&card(), &[attachment("a.png"), attachment("b.png")])
        .await;

    assert_eq!(report.links.len(), 1);
    assert!(report.links.contains_key("b.png"));
    assert_eq!(report.skipped[0].stage, RelocationStage::Upload);
    assert_eq!(storage.file_count(), 1);
}

#[tokio::test]
async fn share_failure_skips_only_that_attachment() {
    let source = Arc::new(source_with(&["a.png", "b.png"]));
    let storage = Arc::new(MemoryStorage::new());
    storage.fail_link_creation("1_b.png");
    let relocator = AttachmentRelocator::new(source, storage.clone(), RelocatorConfig::default());

    let report = relocator
        .relocate(&card(), &[attachment("a.png"), attachment("b.png")])
        .await;

    assert!(report.links.contains_key("a.png"));
    assert!(!report.links.contains_key("b.png"));
    assert_eq!(report.skipped[0].name, "b.png");
    assert_eq!(report.skipped[0].stage, RelocationStage::Share);
    assert_eq!(storage.file_count(), 2);
}

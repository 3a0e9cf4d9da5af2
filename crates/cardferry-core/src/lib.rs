//! cardferry core library
//!
//! The migration pipeline: identity mapping, card normalization, attachment
//! relocation and import orchestration, plus the intermediate file that
//! connects the export and import phases.

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod ir;
pub mod lock;
pub mod model;
pub mod normalize;
pub mod obs;
pub mod relocate;
pub mod telemetry;
pub mod user_map;

pub use config::{
    parse_utc_offset, ExportOptions, ImportConfig, RelocatorConfig, DEFAULT_CONCURRENCY,
};
pub use error::{MigrationError, Result};
pub use export::{export_board, ExportReport};
pub use import::{
    build_story, format_status_line, source_link_comment, CardOutcome, CardState,
    ImportOrchestrator, ImportReport, ImportStatus, STATUS_HEADER,
};
pub use ir::{read_cards, write_cards, DEFAULT_EXPORT_PATH};
pub use lock::ProjectLocks;
pub use model::{Card, Comment, Task};
pub use normalize::{
    flatten_checklists, flatten_labels, parse_source_timestamp, ActionSummary, CardIssue,
    CardNormalizer, NormalizedCard,
};
pub use obs::{new_run_id, MigrationSpan};
pub use relocate::{
    attachment_path, sanitize_file_name, AttachmentRelocator, RelocationReport, RelocationStage,
    SkippedAttachment,
};
pub use telemetry::init_tracing;
pub use user_map::UserMap;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

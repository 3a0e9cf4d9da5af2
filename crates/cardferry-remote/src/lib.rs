//! cardferry-remote: collaborator interfaces for card migration
//!
//! The migration pipeline talks to three independent services. This crate
//! defines what the pipeline needs from each of them:
//!
//! - `SourceClient`: the tracking service cards are read from
//! - `StorageClient`: the file store attachments are relocated to
//! - `DestinationClient`: the tracking service stories are created in
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module; HTTP implementations live in
//! `cardferry-http`.

pub mod destination;
mod error;
pub mod fakes;
pub mod source;
pub mod storage;

pub use destination::{
    CreateComment, CreateLabel, CreateLinkedFile, CreateStory, CreateTask, DestinationClient,
    LinkedFile, StoryId, StorySummary, StoryType,
};
pub use error::{RemoteError, RemoteResult};
pub use source::{
    ActionData, ActionKind, ActionMember, RawAction, RawAttachment, RawCard, RawCheckItem,
    RawChecklist, RawLabel, SourceClient,
};
pub use storage::{ShareLink, StorageClient, UploadRequest, UploadedFile, WriteMode};

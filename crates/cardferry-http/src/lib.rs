//! cardferry-http: HTTP implementations of the collaborator traits
//!
//! - `TrelloClient`: [`SourceClient`](cardferry_remote::SourceClient)
//! - `DropboxClient`: [`StorageClient`](cardferry_remote::StorageClient)
//! - `ClubhouseClient`: [`DestinationClient`](cardferry_remote::DestinationClient)
//!
//! Each client has a `*Config` with `from_env()`. Request failures are
//! reported as [`RemoteError`](cardferry_remote::RemoteError); only client
//! construction uses [`HttpClientError`].

mod clubhouse;
mod dropbox;
mod error;
mod http;
mod trello;

pub use clubhouse::{ClubhouseClient, ClubhouseConfig};
pub use dropbox::{dropbox_content_hash, DropboxClient, DropboxConfig};
pub use error::HttpClientError;
pub use http::DEFAULT_TIMEOUT_SECS;
pub use trello::{TrelloClient, TrelloConfig};

//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `MemorySource`, `MemoryStorage`, and `MemoryDestination` that
//! satisfy the trait contracts without any network access. Each fake can be
//! told to fail specific calls so partial-failure paths can be exercised.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::destination::*;
use crate::error::{RemoteError, RemoteResult};
use crate::source::*;
use crate::storage::*;

fn injected(service: &'static str, what: &str) -> RemoteError {
    RemoteError::Status {
        service,
        status: 500,
        body: format!("injected failure: {what}"),
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// Which source call to fail for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCall {
    Actions,
    Checklists,
    Attachments,
}

/// In-memory board: cards plus per-card actions, checklists and attachments.
#[derive(Debug, Default)]
pub struct MemorySource {
    boards: HashMap<String, Vec<RawCard>>,
    actions: HashMap<String, Vec<RawAction>>,
    checklists: HashMap<String, Vec<RawChecklist>>,
    attachments: HashMap<String, Vec<RawAttachment>>,
    blobs: HashMap<String, Vec<u8>>,
    failing: HashSet<(SourceCall, String)>,
    downloads: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_card(mut self, board_id: &str, card: RawCard) -> Self {
        self.boards.entry(board_id.to_string()).or_default().push(card);
        self
    }

    pub fn with_actions(mut self, card_id: &str, actions: Vec<RawAction>) -> Self {
        self.actions.insert(card_id.to_string(), actions);
        self
    }

    pub fn with_checklists(mut self, card_id: &str, checklists: Vec<RawChecklist>) -> Self {
        self.checklists.insert(card_id.to_string(), checklists);
        self
    }

    pub fn with_attachments(mut self, card_id: &str, attachments: Vec<RawAttachment>) -> Self {
        self.attachments.insert(card_id.to_string(), attachments);
        self
    }

    /// Bytes served for an attachment URL. URLs without a blob fail to download.
    pub fn with_blob(mut self, url: &str, bytes: &[u8]) -> Self {
        self.blobs.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn failing(mut self, call: SourceCall, card_id: &str) -> Self {
        self.failing.insert((call, card_id.to_string()));
        self
    }

    /// Number of download calls served so far (successful or not).
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn check(&self, call: SourceCall, card: &RawCard) -> RemoteResult<()> {
        if self.failing.contains(&(call, card.id.clone())) {
            return Err(injected("trello", &format!("{call:?} for card {}", card.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl SourceClient for MemorySource {
    async fn list_cards(&self, board_id: &str) -> RemoteResult<Vec<RawCard>> {
        self.boards
            .get(board_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("board {board_id}")))
    }

    async fn actions(&self, card: &RawCard) -> RemoteResult<Vec<RawAction>> {
        self.check(SourceCall::Actions, card)?;
        Ok(self.actions.get(&card.id).cloned().unwrap_or_default())
    }

    async fn checklists(&self, card: &RawCard) -> RemoteResult<Vec<RawChecklist>> {
        self.check(SourceCall::Checklists, card)?;
        Ok(self.checklists.get(&card.id).cloned().unwrap_or_default())
    }

    async fn attachments(&self, card: &RawCard) -> RemoteResult<Vec<RawAttachment>> {
        self.check(SourceCall::Attachments, card)?;
        Ok(self.attachments.get(&card.id).cloned().unwrap_or_default())
    }

    async fn download(&self, attachment: &RawAttachment) -> RemoteResult<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .get(&attachment.url)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("attachment {}", attachment.url)))
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-memory storage keyed by lower-cased path, with one link table.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    links: Mutex<BTreeMap<String, ShareLink>>,
    failing_uploads: Mutex<HashSet<String>>,
    failing_links: Mutex<HashSet<String>>,
    fail_listing: Mutex<bool>,
    uploads: AtomicUsize,
    links_created: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail uploads whose path ends with `suffix`.
    pub fn fail_upload(&self, suffix: &str) {
        self.failing_uploads.lock().unwrap().insert(suffix.to_string());
    }

    /// Fail link creation for paths ending with `suffix`.
    pub fn fail_link_creation(&self, suffix: &str) {
        self.failing_links.lock().unwrap().insert(suffix.to_string());
    }

    pub fn fail_link_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(&path.to_lowercase()).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn links_created(&self) -> usize {
        self.links_created.load(Ordering::SeqCst)
    }

    fn matches_any(set: &Mutex<HashSet<String>>, path: &str) -> bool {
        set.lock().unwrap().iter().any(|s| path.ends_with(s.as_str()))
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn upload(&self, request: UploadRequest, contents: Vec<u8>) -> RemoteResult<UploadedFile> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if Self::matches_any(&self.failing_uploads, &request.path) {
            return Err(injected("dropbox", &format!("upload {}", request.path)));
        }
        let key = request.path.to_lowercase();
        let mut files = self.files.lock().unwrap();
        if request.mode == WriteMode::Add && files.contains_key(&key) {
            return Err(RemoteError::Status {
                service: "dropbox",
                status: 409,
                body: format!("path/conflict/file/: {}", request.path),
            });
        }
        files.insert(key, contents);
        Ok(UploadedFile {
            canonical_path: request.path,
            content_hash: None,
        })
    }

    async fn list_shared_links(&self, path: &str) -> RemoteResult<Vec<ShareLink>> {
        if *self.fail_listing.lock().unwrap() {
            return Err(injected("dropbox", &format!("list links {path}")));
        }
        let links = self.links.lock().unwrap();
        Ok(links.get(&path.to_lowercase()).cloned().into_iter().collect())
    }

    async fn create_shared_link(&self, path: &str) -> RemoteResult<ShareLink> {
        if Self::matches_any(&self.failing_links, path) {
            return Err(injected("dropbox", &format!("share {path}")));
        }
        let key = path.to_lowercase();
        if !self.files.lock().unwrap().contains_key(&key) {
            return Err(RemoteError::NotFound(format!("path {path}")));
        }
        let mut links = self.links.lock().unwrap();
        if links.contains_key(&key) {
            return Err(RemoteError::Status {
                service: "dropbox",
                status: 409,
                body: "shared_link_already_exists".to_string(),
            });
        }
        let n = self.links_created.fetch_add(1, Ordering::SeqCst) + 1;
        let file_name = key.rsplit('/').next().unwrap_or_default();
        let link = ShareLink {
            url: format!("https://www.dropbox.com/s/{n:06}/{file_name}?dl=0"),
            canonical_path: key.clone(),
            expires: None,
        };
        links.insert(key, link.clone());
        Ok(link)
    }
}

// ---------------------------------------------------------------------------
// MemoryDestination
// ---------------------------------------------------------------------------

/// A story held by [`MemoryDestination`], with the request that created it.
#[derive(Debug, Clone)]
pub struct StoredStory {
    pub id: StoryId,
    pub request: CreateStory,
}

/// In-memory destination project store.
#[derive(Debug)]
pub struct MemoryDestination {
    stories: Mutex<Vec<StoredStory>>,
    linked_files: Mutex<Vec<(i64, CreateLinkedFile)>>,
    deleted: Mutex<Vec<StoryId>>,
    failing_creates: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<StoryId>>,
    failing_linked_urls: Mutex<HashSet<String>>,
    fail_listing: Mutex<bool>,
    next_id: AtomicI64,
    list_calls: AtomicUsize,
}

impl Default for MemoryDestination {
    fn default() -> Self {
        Self {
            stories: Mutex::new(Vec::new()),
            linked_files: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            failing_creates: Mutex::new(HashSet::new()),
            failing_deletes: Mutex::new(HashSet::new()),
            failing_linked_urls: Mutex::new(HashSet::new()),
            fail_listing: Mutex::new(false),
            next_id: AtomicI64::new(1),
            list_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing story, as if created by an earlier run.
    pub fn seed(&self, project_id: i64, name: &str) -> StoryId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CreateStory {
            project_id,
            workflow_state_id: 0,
            story_type: StoryType::Feature,
            name: name.to_string(),
            description: String::new(),
            requested_by_id: None,
            owner_ids: Vec::new(),
            follower_ids: Vec::new(),
            labels: Vec::new(),
            tasks: Vec::new(),
            comments: Vec::new(),
            deadline: None,
            created_at: None,
            file_ids: Vec::new(),
            linked_file_ids: Vec::new(),
            external_id: None,
        };
        self.stories.lock().unwrap().push(StoredStory { id, request });
        id
    }

    pub fn fail_create(&self, story_name: &str) {
        self.failing_creates.lock().unwrap().insert(story_name.to_string());
    }

    pub fn fail_delete(&self, id: StoryId) {
        self.failing_deletes.lock().unwrap().insert(id);
    }

    pub fn fail_linked_file(&self, url: &str) {
        self.failing_linked_urls.lock().unwrap().insert(url.to_string());
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }

    pub fn stories(&self) -> Vec<StoredStory> {
        self.stories.lock().unwrap().clone()
    }

    pub fn stories_named(&self, name: &str) -> Vec<StoredStory> {
        self.stories()
            .into_iter()
            .filter(|s| s.request.name == name)
            .collect()
    }

    pub fn linked_files(&self) -> Vec<(i64, CreateLinkedFile)> {
        self.linked_files.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<StoryId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DestinationClient for MemoryDestination {
    async fn list_records(&self, project_id: i64) -> RemoteResult<Vec<StorySummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_listing.lock().unwrap() {
            return Err(injected("clubhouse", &format!("list project {project_id}")));
        }
        Ok(self
            .stories
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.request.project_id == project_id)
            .map(|s| StorySummary {
                id: s.id,
                name: s.request.name.clone(),
            })
            .collect())
    }

    async fn delete_record(&self, id: StoryId) -> RemoteResult<()> {
        if self.failing_deletes.lock().unwrap().contains(&id) {
            return Err(injected("clubhouse", &format!("delete story {id}")));
        }
        let mut stories = self.stories.lock().unwrap();
        let before = stories.len();
        stories.retain(|s| s.id != id);
        if stories.len() == before {
            return Err(RemoteError::NotFound(format!("story {id}")));
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }

    async fn create_record(&self, request: &CreateStory) -> RemoteResult<StorySummary> {
        if self.failing_creates.lock().unwrap().contains(&request.name) {
            return Err(RemoteError::Status {
                service: "clubhouse",
                status: 422,
                body: format!("injected failure: create story '{}'", request.name),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.stories.lock().unwrap().push(StoredStory {
            id,
            request: request.clone(),
        });
        Ok(StorySummary {
            id,
            name: request.name.clone(),
        })
    }

    async fn create_linked_file(&self, request: &CreateLinkedFile) -> RemoteResult<LinkedFile> {
        if self.failing_linked_urls.lock().unwrap().contains(&request.url) {
            return Err(injected("clubhouse", &format!("linked file {}", request.url)));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.linked_files.lock().unwrap().push((id, request.clone()));
        Ok(LinkedFile { id })
    }
}

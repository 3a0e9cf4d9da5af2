//! Attachment relocation: source download -> storage upload -> share link.
//!
//! Every attachment lands on a deterministic path, so re-running a card
//! overwrites the previous upload instead of creating a copy, and the
//! existing share link is reused. A failure at any stage skips that one
//! attachment; the card and the batch continue.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use cardferry_remote::{
    RawAttachment, RawCard, RemoteError, RemoteResult, ShareLink, SourceClient, StorageClient,
    UploadRequest,
};
use chrono::Utc;
use regex::Regex;

use crate::config::RelocatorConfig;
use crate::obs;

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.]+").expect("static pattern is valid"))
}

/// Replace every run of characters outside `[A-Za-z0-9_.]` with one `_`.
pub fn sanitize_file_name(name: &str) -> String {
    unsafe_chars().replace_all(name, "_").into_owned()
}

/// `/<root>/<list id>/<card id>/<index>_<sanitized name>`
pub fn attachment_path(root: &str, card: &RawCard, index: usize, sanitized: &str) -> String {
    format!("/{}/{}/{}/{}_{}", root, card.id_list, card.id, index, sanitized)
}

/// Stage at which an attachment was given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationStage {
    Download,
    Upload,
    Share,
}

impl RelocationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelocationStage::Download => "download",
            RelocationStage::Upload => "upload",
            RelocationStage::Share => "share",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAttachment {
    pub index: usize,
    pub name: String,
    pub stage: RelocationStage,
    pub error: RemoteError,
}

/// Outcome of relocating one card's attachments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelocationReport {
    /// Sanitized file name -> public URL.
    pub links: BTreeMap<String, String>,
    pub skipped: Vec<SkippedAttachment>,
}

/// Moves attachments from the source service into shared storage.
pub struct AttachmentRelocator {
    source: Arc<dyn SourceClient>,
    storage: Arc<dyn StorageClient>,
    config: RelocatorConfig,
}

impl AttachmentRelocator {
    pub fn new(
        source: Arc<dyn SourceClient>,
        storage: Arc<dyn StorageClient>,
        config: RelocatorConfig,
    ) -> Self {
        Self {
            source,
            storage,
            config,
        }
    }

    /// Relocate every attachment of `card`, in order.
    ///
    /// Two attachments sanitizing to the same name both get uploaded (the
    /// index keeps their paths apart) but the later one owns the map entry.
    pub async fn relocate(&self, card: &RawCard, attachments: &[RawAttachment]) -> RelocationReport {
        let mut report = RelocationReport::default();
        for (index, attachment) in attachments.iter().enumerate() {
            let name = sanitize_file_name(&attachment.name);
            match self.relocate_one(card, index, &name, attachment).await {
                Ok((link, reused)) => {
                    obs::emit_attachment_relocated(&card.short_url, &name, &link.url, reused);
                    report.links.insert(name, link.url);
                }
                Err((stage, error)) => {
                    obs::emit_attachment_skipped(&card.short_url, &name, stage.as_str(), &error);
                    report.skipped.push(SkippedAttachment {
                        index,
                        name,
                        stage,
                        error,
                    });
                }
            }
        }
        report
    }

    async fn relocate_one(
        &self,
        card: &RawCard,
        index: usize,
        name: &str,
        attachment: &RawAttachment,
    ) -> Result<(ShareLink, bool), (RelocationStage, RemoteError)> {
        let bytes = self
            .source
            .download(attachment)
            .await
            .map_err(|e| (RelocationStage::Download, e))?;

        let path = attachment_path(&self.config.root, card, index, name);
        let request =
            UploadRequest::overwrite(path, self.config.render_client_modified(Utc::now()));
        let uploaded = self
            .storage
            .upload(request, bytes)
            .await
            .map_err(|e| (RelocationStage::Upload, e))?;

        self.resolve_share_link(&uploaded.canonical_path)
            .await
            .map_err(|e| (RelocationStage::Share, e))
    }

    /// Existing link for `path` if there is one, otherwise a new link.
    ///
    /// The flag is `true` when an existing link was reused. A failed listing
    /// is treated as "no links yet".
    pub async fn resolve_share_link(&self, path: &str) -> RemoteResult<(ShareLink, bool)> {
        let existing = match self.storage.list_shared_links(path).await {
            Ok(links) => links,
            Err(error) => {
                tracing::debug!(path = %path, error = %error, "listing shared links failed");
                Vec::new()
            }
        };
        if let Some(link) = existing.into_iter().next() {
            return Ok((link, true));
        }
        let link = self.storage.create_shared_link(path).await?;
        Ok((link, false))
    }
}

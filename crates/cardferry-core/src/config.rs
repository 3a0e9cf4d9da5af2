//! Run configuration passed explicitly into each pipeline component.

use cardferry_remote::StoryType;
use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::error::{MigrationError, Result};

/// Default number of cards normalized concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Options for the export phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub board_id: String,
    /// Download, upload and share attachments while normalizing.
    pub process_attachments: bool,
    /// Upper bound on cards normalized at once. Output order is unaffected.
    pub concurrency: usize,
}

impl ExportOptions {
    pub fn new(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            process_attachments: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_attachments(mut self, process: bool) -> Self {
        self.process_attachments = process;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.board_id.trim().is_empty() {
            return Err(MigrationError::InvalidConfig(
                "board id must not be empty".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(MigrationError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where and how attachments are written to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct RelocatorConfig {
    /// Top-level storage folder, without slashes.
    pub root: String,
    /// Wall-clock shift applied to the client-modified timestamp.
    ///
    /// Storage only accepts the `...Z` form, so a non-zero offset moves the
    /// displayed time; it is not converted back to UTC.
    pub utc_offset: FixedOffset,
    /// strftime pattern for the client-modified timestamp.
    pub client_modified_format: String,
}

impl Default for RelocatorConfig {
    fn default() -> Self {
        Self {
            root: "trello".to_string(),
            utc_offset: Utc.fix(),
            client_modified_format: "%Y-%m-%dT%H:%M:%SZ".to_string(),
        }
    }
}

impl RelocatorConfig {
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into().trim_matches('/').to_string();
        self
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Local wall-clock time in `utc_offset`, formatted with
    /// `client_modified_format` (default keeps the literal `Z`).
    pub fn render_client_modified(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.utc_offset)
            .format(&self.client_modified_format)
            .to_string()
    }
}

/// Parse `Z`, `UTC`, `+HH:MM`, `-HH:MM` or `+HHMM` into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    let invalid = || MigrationError::InvalidConfig(format!("invalid UTC offset '{raw}'"));
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Destination-side settings for the import phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub project_id: i64,
    pub workflow_state_id: i64,
    pub story_type: StoryType,
    /// Destination user performing the import; uploader of linked files and
    /// requester of stories whose creator is unmapped.
    pub import_member_id: String,
    /// Append a trailing comment linking back to the source card.
    pub add_source_link_comment: bool,
    /// Provider tag for linked files.
    pub storage_provider: String,
}

impl ImportConfig {
    pub fn new(project_id: i64, workflow_state_id: i64, import_member_id: impl Into<String>) -> Self {
        Self {
            project_id,
            workflow_state_id,
            story_type: StoryType::default(),
            import_member_id: import_member_id.into(),
            add_source_link_comment: false,
            storage_provider: "dropbox".to_string(),
        }
    }

    pub fn with_story_type(mut self, story_type: StoryType) -> Self {
        self.story_type = story_type;
        self
    }

    pub fn with_source_link_comment(mut self, add: bool) -> Self {
        self.add_source_link_comment = add;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.import_member_id.trim().is_empty() {
            return Err(MigrationError::InvalidConfig(
                "import member id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_export_options_validation() {
        assert!(ExportOptions::new("b1").validate().is_ok());
        assert!(ExportOptions::new(" ").validate().is_err());
        assert!(ExportOptions::new("b1")
            .with_concurrency(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_parse_utc_offset_forms() {
        assert_eq!(parse_utc_offset("Z").expect("z").local_minus_utc(), 0);
        assert_eq!(
            parse_utc_offset("-07:00").expect("neg").local_minus_utc(),
            -7 * 3600
        );
        assert_eq!(
            parse_utc_offset("+0530").expect("pos").local_minus_utc(),
            5 * 3600 + 30 * 60
        );
        assert!(parse_utc_offset("7").is_err());
        assert!(parse_utc_offset("+07:75").is_err());
        assert!(parse_utc_offset("America/Boise").is_err());
    }

    #[test]
    fn test_client_modified_rendered_in_offset() {
        let config = RelocatorConfig::default()
            .with_utc_offset(parse_utc_offset("-07:00").expect("offset"));
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(config.render_client_modified(at), "2024-03-01T05:00:00Z");
    }

    #[test]
    fn test_relocator_root_is_trimmed() {
        let config = RelocatorConfig::default().with_root("/attachments/");
        assert_eq!(config.root, "attachments");
    }

    #[test]
    fn test_import_config_requires_member() {
        assert!(ImportConfig::new(1, 2, "").validate().is_err());
        let config = ImportConfig::new(1, 2, "m-1").with_story_type(StoryType::Bug);
        assert!(config.validate().is_ok());
        assert_eq!(config.storage_provider, "dropbox");
    }
}

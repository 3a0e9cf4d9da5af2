//! Export phase: list a board and normalize every card on it.

use cardferry_remote::SourceClient;
use futures::stream::{self, StreamExt};

use crate::config::ExportOptions;
use crate::error::{MigrationError, Result};
use crate::model::Card;
use crate::normalize::{CardIssue, CardNormalizer};
use crate::obs;

/// Normalized cards in board order, plus every recovered problem keyed by
/// card source URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub cards: Vec<Card>,
    pub issues: Vec<(String, CardIssue)>,
}

impl ExportReport {
    /// Number of cards that needed at least one recovery.
    pub fn cards_with_issues(&self) -> usize {
        let mut urls: Vec<&str> = self.issues.iter().map(|(url, _)| url.as_str()).collect();
        urls.dedup();
        urls.len()
    }
}

/// Normalize every card on `options.board_id`.
///
/// Up to `options.concurrency` cards are in flight at once; the output keeps
/// the order the board listing returned. Attachments are relocated only if
/// `normalizer` was built with a relocator. Only a failed board listing is
/// an error.
pub async fn export_board(
    source: &dyn SourceClient,
    normalizer: &CardNormalizer,
    options: &ExportOptions,
) -> Result<ExportReport> {
    options.validate()?;

    let raw_cards = source
        .list_cards(&options.board_id)
        .await
        .map_err(|source| MigrationError::BoardListing {
            board: options.board_id.clone(),
            source,
        })?;
    tracing::info!(
        event = "board.listed",
        board = %options.board_id,
        cards = raw_cards.len(),
    );

    let normalized: Vec<_> = stream::iter(raw_cards.iter())
        .map(|raw| normalizer.normalize(raw))
        .buffered(options.concurrency)
        .collect()
        .await;

    let mut report = ExportReport::default();
    for item in normalized {
        let url = item.card.source_url.clone();
        report
            .issues
            .extend(item.issues.into_iter().map(|issue| (url.clone(), issue)));
        report.cards.push(item.card);
    }
    obs::emit_phase_finished("export", report.cards.len(), report.cards_with_issues());
    Ok(report)
}

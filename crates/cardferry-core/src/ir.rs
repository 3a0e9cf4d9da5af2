//! Reading and writing the intermediate export file.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::Card;

/// File the export phase writes when no path is given.
pub const DEFAULT_EXPORT_PATH: &str = "cardferry-export.json";

/// Write `cards` as a pretty-printed JSON array.
pub fn write_cards(path: &Path, cards: &[Card]) -> Result<()> {
    let mut json = serde_json::to_string_pretty(cards)?;
    json.push('\n');
    fs::write(path, json)?;
    tracing::info!(event = "ir.written", path = %path.display(), cards = cards.len());
    Ok(())
}

pub fn read_cards(path: &Path) -> Result<Vec<Card>> {
    let content = fs::read_to_string(path)?;
    let cards: Vec<Card> = serde_json::from_str(&content)?;
    tracing::debug!(event = "ir.read", path = %path.display(), cards = cards.len());
    Ok(cards)
}

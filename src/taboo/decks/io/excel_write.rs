use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::Workbook;
use tracing::{info, instrument};

use crate::taboo::decks::error::Result;
use crate::taboo::decks::model::Deck;
use crate::taboo::decks::parse::layout_cards;

/// Cards stacked in one column before the export starts the next column.
pub const DEFAULT_CARDS_PER_COLUMN: usize = 20;

const MAX_SHEET_NAME_LEN: usize = 31;

/// Writes each deck to its own worksheet in the column layout the card
/// parser reads, so an exported file can be imported again.
#[instrument(level = "info", skip(decks), fields(path = %path.display(), deck_count = decks.len()))]
pub fn export_decks(path: &Path, decks: &[Deck], cards_per_column: usize) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let mut sheet_names = SheetNameRegistry::default();

    for deck in decks {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(sheet_names.assign(&deck.name))?;

        let rows = layout_cards(&deck.cards, deck.taboo_words_per_card, cards_per_column);
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                worksheet.write_string(row_idx as u32, col_idx as u16, cell)?;
            }
        }
    }

    workbook_writer.save(path)?;
    info!("decks exported");
    Ok(())
}

#[derive(Debug, Default)]
struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }

        let mut counter = 1;
        loop {
            let suffix = format!("_{counter}");
            let prefix = truncate_chars(&base, MAX_SHEET_NAME_LEN - suffix.len());
            let candidate = format!("{prefix}{suffix}");
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    // Excel rejects names that begin or end with an apostrophe.
    let sanitized = sanitized.trim().trim_matches('\'').trim();
    if sanitized.is_empty() {
        return "Deck".to_string();
    }

    truncate_chars(sanitized, MAX_SHEET_NAME_LEN)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

//! Column-oriented card layout.
//!
//! Spreadsheets store one card per vertical group of cells: the headword on
//! the first row of the group followed by `taboo_words_per_card` rows of
//! taboo words. Groups are stacked down each column and columns are read
//! left to right.

use tracing::debug;

use crate::taboo::decks::error::Result;
use crate::taboo::decks::model::{Card, MAX_TABOO_WORDS_PER_CARD, resolve_group_size, widest_card};

/// Row-major matrix of cell text. Rows may have unequal length.
pub type CellMatrix = Vec<Vec<String>>;

/// Pads every row to the widest row and returns the matrix column by column.
pub fn transpose_to_columns<R, S>(rows: &[R]) -> Vec<Vec<String>>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let width = rows.iter().map(|row| row.as_ref().len()).max().unwrap_or(0);

    (0..width)
        .map(|col_idx| {
            rows.iter()
                .map(|row| {
                    row.as_ref()
                        .get(col_idx)
                        .map(|cell| cell.as_ref().to_string())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

/// Parses a row-major cell matrix into cards.
///
/// `group_size_param` is the number of taboo rows per card; values below one
/// are treated as one. Within a column:
///
/// * a group whose cells are all blank ends the column;
/// * a group with a blank headword but some taboo text is skipped;
/// * otherwise the trimmed headword and the non-blank trimmed taboo cells
///   form one card.
pub fn parse_cards<R, S>(rows: &[R], group_size_param: i64) -> Vec<Card>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let group_size = 1 + resolve_group_size(group_size_param);
    let mut cards = Vec::new();

    for (col_idx, column) in transpose_to_columns(rows).iter().enumerate() {
        let before = cards.len();
        parse_column(column, group_size, &mut cards);
        debug!(
            column = col_idx,
            cards = cards.len() - before,
            "parsed spreadsheet column"
        );
    }

    cards
}

fn parse_column(column: &[String], group_size: usize, cards: &mut Vec<Card>) {
    for group in column.chunks(group_size) {
        let mut cells = group.iter().map(|cell| cell.trim());
        let word = cells.next().unwrap_or_default();
        let taboo: Vec<String> = cells
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect();

        if word.is_empty() {
            if taboo.is_empty() {
                break;
            }
            continue;
        }

        cards.push(Card {
            word: word.to_string(),
            taboo,
        });
    }
}

/// Decodes CSV text into a row-major matrix. There is no header row and
/// records may differ in width.
pub fn parse_csv_matrix(text: &str) -> Result<CellMatrix> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Decodes CSV text and parses it with the given layout parameter.
pub fn parse_deck_from_csv(text: &str, taboo_words_per_card: i64) -> Result<Vec<Card>> {
    let rows = parse_csv_matrix(text)?;
    Ok(parse_cards(&rows, taboo_words_per_card))
}

/// Lays cards out in the column format read by [`parse_cards`].
///
/// Each column holds at most `cards_per_column` cards. The layout parameter
/// grows to fit the widest card so no taboo word is dropped, and blank
/// padding is capped at [`MAX_TABOO_WORDS_PER_CARD`] slots.
pub fn layout_cards(
    cards: &[Card],
    taboo_words_per_card: usize,
    cards_per_column: usize,
) -> CellMatrix {
    let slots = taboo_words_per_card
        .min(MAX_TABOO_WORDS_PER_CARD)
        .max(widest_card(cards).unwrap_or(0))
        .max(1);
    let cards_per_column = cards_per_column.max(1);

    let columns: Vec<Vec<String>> = cards
        .chunks(cards_per_column)
        .map(|chunk| {
            let mut column = Vec::with_capacity(chunk.len() * (slots + 1));
            for card in chunk {
                column.push(card.word.clone());
                for slot in 0..slots {
                    column.push(card.taboo.get(slot).cloned().unwrap_or_default());
                }
            }
            column
        })
        .collect();

    let height = columns.iter().map(Vec::len).max().unwrap_or(0);
    (0..height)
        .map(|row_idx| {
            columns
                .iter()
                .map(|column| column.get(row_idx).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

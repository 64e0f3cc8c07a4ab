#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use taboo_decks::DeckError;
use taboo_decks::io::{SpreadsheetClient, TabMeta, WorkbookMeta};
use taboo_decks::model::{Card, Deck, SourceType};
use taboo_decks::parse::CellMatrix;

/// In-memory spreadsheet source. Content can be changed between calls to
/// simulate edits made in the external spreadsheet.
#[derive(Default)]
pub struct FakeClient {
    csv: RefCell<HashMap<String, String>>,
    workbooks: RefCell<HashMap<String, WorkbookMeta>>,
    tabs: RefCell<HashMap<(String, String), CellMatrix>>,
    failing: RefCell<HashSet<String>>,
    calls: RefCell<Vec<String>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_csv(&self, locator: &str, text: &str) {
        self.csv
            .borrow_mut()
            .insert(locator.to_string(), text.to_string());
    }

    /// Makes every fetch for `locator` (CSV, metadata, or tab key
    /// `sheet/tab`) fail.
    pub fn fail(&self, locator: &str) {
        self.failing.borrow_mut().insert(locator.to_string());
    }

    pub fn set_workbook(&self, sheet_id: &str, title: &str, tabs: &[(&str, i64, CellMatrix)]) {
        let meta = WorkbookMeta {
            sheet_id: sheet_id.to_string(),
            title: title.to_string(),
            tabs: tabs
                .iter()
                .map(|(name, gid, _)| TabMeta {
                    title: name.to_string(),
                    gid: *gid,
                })
                .collect(),
        };
        self.workbooks
            .borrow_mut()
            .insert(sheet_id.to_string(), meta);
        for (name, _, rows) in tabs {
            self.set_tab(sheet_id, name, rows.clone());
        }
    }

    pub fn set_tab(&self, sheet_id: &str, tab_name: &str, rows: CellMatrix) {
        self.tabs
            .borrow_mut()
            .insert((sheet_id.to_string(), tab_name.to_string()), rows);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn check(&self, key: &str) -> Result<(), DeckError> {
        self.calls.borrow_mut().push(key.to_string());
        if self.failing.borrow().contains(key) {
            return Err(DeckError::FetchFailed {
                locator: key.to_string(),
                reason: "status 500 Internal Server Error: boom".to_string(),
            });
        }
        Ok(())
    }
}

impl SpreadsheetClient for FakeClient {
    fn fetch_csv(&self, locator: &str) -> taboo_decks::Result<String> {
        self.check(locator)?;
        self.csv
            .borrow()
            .get(locator)
            .cloned()
            .ok_or_else(|| DeckError::FetchFailed {
                locator: locator.to_string(),
                reason: "status 404 Not Found".to_string(),
            })
    }

    fn fetch_workbook_meta(&self, locator: &str) -> taboo_decks::Result<WorkbookMeta> {
        self.check(locator)?;
        self.workbooks
            .borrow()
            .get(locator)
            .cloned()
            .ok_or_else(|| DeckError::FetchFailed {
                locator: locator.to_string(),
                reason: "status 404 Not Found".to_string(),
            })
    }

    fn fetch_tab_values(&self, sheet_id: &str, tab_name: &str) -> taboo_decks::Result<CellMatrix> {
        let key = format!("{sheet_id}/{tab_name}");
        self.check(&key)?;
        self.tabs
            .borrow()
            .get(&(sheet_id.to_string(), tab_name.to_string()))
            .cloned()
            .ok_or_else(|| DeckError::FetchFailed {
                locator: key,
                reason: "status 400 Bad Request".to_string(),
            })
    }
}

/// Builds a row-major matrix from string literals.
pub fn matrix(rows: &[&[&str]]) -> CellMatrix {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

pub fn card(word: &str, taboo: &[&str]) -> Card {
    Card::new(word, taboo.iter().copied())
}

pub fn deck(id: &str, category: &str, source: &str, cards: Vec<Card>) -> Deck {
    Deck {
        id: id.to_string(),
        name: format!("Deck {id}"),
        category: category.to_string(),
        card_count: cards.len(),
        source_type: SourceType::from_locator(source),
        source: source.to_string(),
        taboo_words_per_card: 2,
        cards,
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category every library carries; it can never be deleted.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Name given to imported decks when the caller does not supply one.
pub const DEFAULT_DECK_NAME: &str = "Imported deck";
/// Title used when a workbook payload does not carry one.
pub const UNTITLED_WORKBOOK: &str = "Untitled Workbook";
/// Taboo rows per card assumed by the column layout unless configured.
pub const DEFAULT_TABOO_WORDS_PER_CARD: usize = 4;
/// Largest layout accepted from callers. Cards wider than this still keep
/// every taboo word; the bound only applies to blank padding.
pub const MAX_TABOO_WORDS_PER_CARD: usize = 64;

/// Identifier assigned to a deck when it is imported.
pub type DeckId = String;
/// Identifier assigned to a workbook record by the workbook store.
pub type WorkbookId = String;

/// A headword together with the words that may not be said while
/// describing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub word: String,
    pub taboo: Vec<String>,
}

impl Card {
    pub fn new<I, S>(word: impl Into<String>, taboo: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            word: word.into(),
            taboo: taboo.into_iter().map(Into::into).collect(),
        }
    }
}

/// Where a deck's cards were fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A Google Sheets tab or spreadsheet URL.
    GoogleSheets,
    /// Any other URL or file serving CSV text.
    Csv,
    /// Decks without a fetchable origin.
    Other,
}

impl SourceType {
    /// Infers the source type from the locator the deck was imported from.
    pub fn from_locator(locator: &str) -> Self {
        if locator.contains("docs.google.com") {
            SourceType::GoogleSheets
        } else if locator.trim().is_empty() {
            SourceType::Other
        } else {
            SourceType::Csv
        }
    }

    /// Whether the bulk sweep may fetch this source again.
    pub fn is_refetchable(self) -> bool {
        matches!(self, SourceType::GoogleSheets | SourceType::Csv)
    }
}

/// A named, categorised collection of cards with its source metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub category: String,
    pub card_count: usize,
    pub source_type: SourceType,
    pub source: String,
    /// Layout parameter used when the deck is parsed from its source again.
    #[serde(default = "default_taboo_words_per_card")]
    pub taboo_words_per_card: usize,
    #[serde(default)]
    pub cards: Vec<Card>,
}

fn default_taboo_words_per_card() -> usize {
    DEFAULT_TABOO_WORDS_PER_CARD
}

impl Deck {
    /// Replaces the cards while keeping the configured layout.
    pub fn replace_cards(&mut self, cards: Vec<Card>) {
        self.card_count = cards.len();
        self.cards = cards;
    }

    /// Replaces the cards and sets the layout to the widest new card. An
    /// empty card list keeps the prior layout.
    pub fn replace_cards_and_layout(&mut self, cards: Vec<Card>) {
        if let Some(widest) = widest_card(&cards) {
            self.taboo_words_per_card = widest.max(1);
        }
        self.replace_cards(cards);
    }
}

/// Number of taboo words on the widest card, if any card exists.
pub fn widest_card(cards: &[Card]) -> Option<usize> {
    cards.iter().map(|card| card.taboo.len()).max()
}

/// The persisted library: ordered categories and ordered decks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryState {
    pub categories: Vec<String>,
    pub decks: Vec<Deck>,
}

impl Default for LibraryState {
    fn default() -> Self {
        Self {
            categories: vec![UNCATEGORIZED.to_string()],
            decks: Vec::new(),
        }
    }
}

impl LibraryState {
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|category| category == name)
    }

    /// Appends the category when missing. Returns `true` when it was added.
    pub fn ensure_category(&mut self, name: &str) -> bool {
        if self.has_category(name) {
            return false;
        }
        self.categories.push(name.to_string());
        true
    }

    pub fn find_deck(&self, id: &str) -> Option<&Deck> {
        self.decks.iter().find(|deck| deck.id == id)
    }

    pub fn find_deck_mut(&mut self, id: &str) -> Option<&mut Deck> {
        self.decks.iter_mut().find(|deck| deck.id == id)
    }

    /// Repairs structural invariants of a freshly decoded document.
    pub fn normalized(mut self) -> Self {
        if !self.has_category(UNCATEGORIZED) {
            self.categories.insert(0, UNCATEGORIZED.to_string());
        }
        let referenced: Vec<String> = self
            .decks
            .iter()
            .map(|deck| deck.category.clone())
            .collect();
        for category in referenced {
            self.ensure_category(&category);
        }
        for deck in &mut self.decks {
            deck.card_count = deck.cards.len();
            deck.taboo_words_per_card = deck.taboo_words_per_card.max(1);
        }
        self
    }
}

/// One tab of a linked workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub tab_name: String,
    pub sheet_gid: i64,
    /// Deck created for this tab during registration, if any.
    pub deck_id: Option<DeckId>,
}

/// A multi-tab external spreadsheet linked to decks in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub id: WorkbookId,
    pub external_workbook_id: String,
    pub name: String,
    pub tabs: Vec<Tab>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl Workbook {
    /// Deck ids linked from any tab, in tab order.
    pub fn linked_deck_ids(&self) -> impl Iterator<Item = &str> {
        self.tabs.iter().filter_map(|tab| tab.deck_id.as_deref())
    }
}

/// Cards parsed from one tab of an external workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTab {
    pub tab_name: String,
    pub sheet_gid: i64,
    pub cards: Vec<Card>,
}

/// A fully fetched and parsed external workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedWorkbook {
    pub sheet_id: String,
    pub name: String,
    pub tabs: Vec<ParsedTab>,
}

/// Resolves a deck name: trimmed caller value, else [`DEFAULT_DECK_NAME`].
pub fn resolve_deck_name(name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DECK_NAME)
        .to_string()
}

/// Resolves a category: trimmed caller value, else [`UNCATEGORIZED`].
pub fn resolve_category(category: Option<&str>) -> String {
    category
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .unwrap_or(UNCATEGORIZED)
        .to_string()
}

/// Clamps a layout parameter to at least one taboo row per card.
pub fn resolve_group_size(taboo_words_per_card: i64) -> usize {
    taboo_words_per_card.max(1) as usize
}

/// Converts a stored layout into the parser's signed group size parameter
/// without wrapping.
pub fn group_size_param(taboo_words_per_card: usize) -> i64 {
    i64::try_from(taboo_words_per_card).unwrap_or(i64::MAX)
}

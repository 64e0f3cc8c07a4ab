use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::taboo::decks::error::{DeckError, Result};
use crate::taboo::decks::io::SpreadsheetClient;
use crate::taboo::decks::model::{
    Card, Deck, DeckId, LibraryState, MAX_TABOO_WORDS_PER_CARD, SourceType, group_size_param,
    resolve_category, resolve_deck_name,
};
use crate::taboo::decks::parse::parse_deck_from_csv;
use crate::taboo::decks::store::LibraryStore;

/// Where a deck came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub source_type: SourceType,
    pub locator: String,
}

impl SourceDescriptor {
    pub fn new(source_type: SourceType, locator: impl Into<String>) -> Self {
        Self {
            source_type,
            locator: locator.into(),
        }
    }

    /// Infers the source type from the locator.
    pub fn from_locator(locator: &str) -> Self {
        Self::new(SourceType::from_locator(locator), locator.trim())
    }
}

/// Everything needed to add a deck to the library.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeck {
    pub cards: Vec<Card>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub source: SourceDescriptor,
    pub taboo_words_per_card: usize,
}

/// Request to import one deck from a CSV-serving URL or file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    pub url: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub taboo_words_per_card: i64,
}

/// Adds a deck to the library with a single load-mutate-save cycle and
/// returns its id.
#[instrument(level = "info", skip_all, fields(source = %new_deck.source.locator))]
pub fn import_deck(store: &dyn LibraryStore, new_deck: NewDeck) -> Result<DeckId> {
    let mut state = store.load();
    let id = import_into(&mut state, new_deck)?;
    store.save(&state)?;
    Ok(id)
}

/// Adds a deck to an in-memory library state. The category is created when
/// the library does not know it yet.
pub fn import_into(state: &mut LibraryState, new_deck: NewDeck) -> Result<DeckId> {
    if new_deck.cards.is_empty() {
        return Err(DeckError::InvalidArgument(
            "cannot import a deck without cards".into(),
        ));
    }

    let name = resolve_deck_name(new_deck.name.as_deref());
    let category = resolve_category(new_deck.category.as_deref());
    if state.ensure_category(&category) {
        debug!(%category, "category created by import");
    }

    let deck = Deck {
        id: Uuid::new_v4().to_string(),
        name,
        category,
        card_count: new_deck.cards.len(),
        source_type: new_deck.source.source_type,
        source: new_deck.source.locator,
        taboo_words_per_card: new_deck.taboo_words_per_card.max(1),
        cards: new_deck.cards,
    };
    let id = deck.id.clone();
    info!(deck_id = %id, name = %deck.name, cards = deck.card_count, "deck imported");
    state.decks.push(deck);
    Ok(id)
}

/// Fetches CSV from `request.url`, parses it, and imports the result.
#[instrument(level = "info", skip_all, fields(url = %request.url))]
pub fn import_from_source(
    store: &dyn LibraryStore,
    client: &dyn SpreadsheetClient,
    request: ImportRequest,
) -> Result<DeckId> {
    if !(1..=MAX_TABOO_WORDS_PER_CARD as i64).contains(&request.taboo_words_per_card) {
        return Err(DeckError::InvalidArgument(format!(
            "taboo_words_per_card must be between 1 and {MAX_TABOO_WORDS_PER_CARD}"
        )));
    }

    let cards = fetch_deck_cards(client, &request.url, request.taboo_words_per_card)?;
    if cards.is_empty() {
        return Err(DeckError::ParseEmpty(request.url));
    }

    import_deck(
        store,
        NewDeck {
            cards,
            name: request.name,
            category: request.category,
            source: SourceDescriptor::from_locator(&request.url),
            taboo_words_per_card: request.taboo_words_per_card as usize,
        },
    )
}

/// Fetches a single CSV source and parses it with the given layout.
pub fn fetch_deck_cards(
    client: &dyn SpreadsheetClient,
    locator: &str,
    taboo_words_per_card: i64,
) -> Result<Vec<Card>> {
    let text = client.fetch_csv(locator)?;
    parse_deck_from_csv(&text, taboo_words_per_card)
}

/// Replaces a deck's cards. Returns `false`, without saving, when the deck
/// no longer exists.
#[instrument(level = "info", skip(store, cards), fields(card_count = cards.len()))]
pub fn refresh_deck(store: &dyn LibraryStore, deck_id: &str, cards: Vec<Card>) -> Result<bool> {
    let mut state = store.load();
    if !refresh_into(&mut state, deck_id, cards) {
        return Ok(false);
    }
    store.save(&state)?;
    Ok(true)
}

/// Replaces a deck's cards in an in-memory library state. The layout becomes
/// the widest new card's taboo count; id, name, category, and source stay
/// as they are.
pub fn refresh_into(state: &mut LibraryState, deck_id: &str, cards: Vec<Card>) -> bool {
    match state.find_deck_mut(deck_id) {
        Some(deck) => {
            deck.replace_cards_and_layout(cards);
            debug!(deck_id, cards = deck.card_count, "deck refreshed");
            true
        }
        None => {
            debug!(deck_id, "refresh target no longer exists");
            false
        }
    }
}

/// Result of one item in a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    Updated { card_count: usize },
    Skipped { reason: String },
    Failed { reason: String },
}

/// One deck or tab visited by a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepItem {
    /// Deck id, or tab name for workbook reloads.
    pub target: String,
    pub deck_id: Option<DeckId>,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

/// Per-item outcomes of a bulk operation. A sweep that updates nothing is
/// still a successful sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub items: Vec<SweepItem>,
}

impl SweepReport {
    pub fn record(&mut self, target: impl Into<String>, deck_id: Option<&str>, outcome: SweepOutcome) {
        self.items.push(SweepItem {
            target: target.into(),
            deck_id: deck_id.map(str::to_string),
            outcome,
        });
    }

    pub fn updated(&self) -> impl Iterator<Item = &SweepItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, SweepOutcome::Updated { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &SweepItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, SweepOutcome::Failed { .. }))
    }

    pub fn updated_count(&self) -> usize {
        self.updated().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }
}

/// Re-fetches every deck with a refetchable, non-empty source.
///
/// Failures are recorded per deck and never abort the sweep. A fetch that
/// yields no cards leaves the deck untouched. All updates are committed
/// with one save at the end.
#[instrument(level = "info", skip_all)]
pub fn refresh_from_source(
    store: &dyn LibraryStore,
    client: &dyn SpreadsheetClient,
) -> Result<SweepReport> {
    let mut state = store.load();
    let mut report = SweepReport::default();

    for deck in state.decks.iter_mut() {
        if !deck.source_type.is_refetchable() || deck.source.trim().is_empty() {
            continue;
        }

        let outcome = match fetch_deck_cards(client, &deck.source, group_size_param(deck.taboo_words_per_card)) {
            Ok(cards) if cards.is_empty() => {
                let err = DeckError::ParseEmpty(deck.source.clone());
                warn!(deck_id = %deck.id, error = %err, "deck refresh produced no cards");
                SweepOutcome::Failed {
                    reason: err.to_string(),
                }
            }
            Ok(cards) => {
                deck.replace_cards(cards);
                SweepOutcome::Updated {
                    card_count: deck.card_count,
                }
            }
            Err(err) => {
                warn!(deck_id = %deck.id, error = %err, "failed to refresh deck");
                SweepOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };
        report.record(deck.id.clone(), Some(deck.id.as_str()), outcome);
    }

    if report.updated_count() > 0 {
        store.save(&state)?;
    }
    info!(
        updated = report.updated_count(),
        failed = report.failed_count(),
        "refresh sweep finished"
    );
    Ok(report)
}

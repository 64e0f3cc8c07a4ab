//! Durable storage for the deck library and workbook records.
//!
//! Every helper loads a fresh copy, mutates it locally, and saves the whole
//! document once. Nothing holds a mutable reference across calls, and
//! concurrent top-level operations are last-write-wins at document level.

pub mod json;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::taboo::decks::error::{DeckError, Result};
use crate::taboo::decks::model::{Deck, LibraryState, UNCATEGORIZED, Workbook, WorkbookId};

pub use json::{JsonLibraryStore, JsonWorkbookStore};
pub use memory::{MemoryLibraryStore, MemoryWorkbookStore};

/// Persistence for the single library document.
pub trait LibraryStore {
    /// Returns the persisted state, or the default state when nothing is
    /// stored or the stored document is unreadable.
    fn load(&self) -> LibraryState;

    /// Persists the full state as one unit.
    fn save(&self, state: &LibraryState) -> Result<()>;

    /// Inserts the deck when its id is unseen, otherwise replaces it.
    fn upsert_deck(&self, deck: Deck) -> Result<LibraryState> {
        let mut state = self.load();
        state.ensure_category(&deck.category);
        match state.find_deck_mut(&deck.id) {
            Some(existing) => *existing = deck,
            None => state.decks.push(deck),
        }
        self.save(&state)?;
        Ok(state)
    }

    /// Removes the deck with the given id. A missing id leaves the library
    /// untouched.
    fn delete_deck(&self, id: &str) -> Result<LibraryState> {
        let mut state = self.load();
        if remove_decks(&mut state, &[id]) > 0 {
            self.save(&state)?;
        }
        Ok(state)
    }

    /// Like [`LibraryStore::delete_deck`] but reports a missing id.
    fn delete_deck_strict(&self, id: &str) -> Result<LibraryState> {
        let mut state = self.load();
        if remove_decks(&mut state, &[id]) == 0 {
            return Err(DeckError::deck_not_found(id));
        }
        self.save(&state)?;
        Ok(state)
    }

    /// Removes every listed deck with a single save. Returns how many decks
    /// were removed.
    fn delete_decks(&self, ids: &[&str]) -> Result<usize> {
        let mut state = self.load();
        let removed = remove_decks(&mut state, ids);
        if removed > 0 {
            self.save(&state)?;
        }
        Ok(removed)
    }

    /// Adds a category unless it already exists.
    fn add_category(&self, name: &str) -> Result<LibraryState> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DeckError::InvalidArgument(
                "category name cannot be empty".into(),
            ));
        }

        let mut state = self.load();
        if state.ensure_category(name) {
            self.save(&state)?;
            info!(category = name, "category added");
        }
        Ok(state)
    }

    /// Deletes a category and moves its decks to [`UNCATEGORIZED`].
    fn delete_category(&self, name: &str) -> Result<LibraryState> {
        if name == UNCATEGORIZED {
            return Err(DeckError::InvalidArgument(format!(
                "cannot delete the '{UNCATEGORIZED}' category"
            )));
        }

        let mut state = self.load();
        if !state.has_category(name) {
            return Err(DeckError::category_not_found(name));
        }

        let mut migrated = 0;
        for deck in state.decks.iter_mut().filter(|deck| deck.category == name) {
            deck.category = UNCATEGORIZED.to_string();
            migrated += 1;
        }
        state.ensure_category(UNCATEGORIZED);
        state.categories.retain(|category| category != name);

        self.save(&state)?;
        info!(category = name, migrated, "category deleted");
        Ok(state)
    }

    /// Moves a deck into an existing category.
    fn move_deck_category(&self, id: &str, category: &str) -> Result<LibraryState> {
        let mut state = self.load();
        if !state.has_category(category) {
            return Err(DeckError::InvalidArgument(format!(
                "target category '{category}' does not exist"
            )));
        }

        let deck = state
            .find_deck_mut(id)
            .ok_or_else(|| DeckError::deck_not_found(id))?;
        deck.category = category.to_string();

        self.save(&state)?;
        Ok(state)
    }
}

fn remove_decks(state: &mut LibraryState, ids: &[&str]) -> usize {
    let before = state.decks.len();
    state.decks.retain(|deck| !ids.contains(&deck.id.as_str()));
    before - state.decks.len()
}

/// On-disk shape of the workbook collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookIndex {
    #[serde(default)]
    pub workbooks: Vec<Workbook>,
}

/// Persistence for linked workbook records.
pub trait WorkbookStore {
    /// Returns every stored record, or none when the document is missing or
    /// unreadable.
    fn load(&self) -> WorkbookIndex;

    /// Persists every record as one unit.
    fn save(&self, index: &WorkbookIndex) -> Result<()>;

    fn list(&self) -> Vec<Workbook> {
        self.load().workbooks
    }

    fn get(&self, id: &str) -> Result<Workbook> {
        self.load()
            .workbooks
            .into_iter()
            .find(|workbook| workbook.id == id)
            .ok_or_else(|| DeckError::workbook_not_found(id))
    }

    /// Stores a new record under a freshly assigned id and returns that id.
    fn insert(&self, mut workbook: Workbook) -> Result<WorkbookId> {
        let mut index = self.load();
        workbook.id = Uuid::new_v4().to_string();
        let id = workbook.id.clone();
        index.workbooks.push(workbook);
        self.save(&index)?;
        Ok(id)
    }

    fn touch_last_synced(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut index = self.load();
        let workbook = index
            .workbooks
            .iter_mut()
            .find(|workbook| workbook.id == id)
            .ok_or_else(|| DeckError::workbook_not_found(id))?;
        workbook.last_synced = Some(at);
        self.save(&index)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut index = self.load();
        let before = index.workbooks.len();
        index.workbooks.retain(|workbook| workbook.id != id);
        if index.workbooks.len() == before {
            return Err(DeckError::workbook_not_found(id));
        }
        self.save(&index)
    }
}

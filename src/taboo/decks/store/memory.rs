use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::taboo::decks::error::Result;
use crate::taboo::decks::model::LibraryState;
use crate::taboo::decks::store::json::{decode_document, encode_document};
use crate::taboo::decks::store::{LibraryStore, WorkbookIndex, WorkbookStore};

/// Library store that keeps the encoded document in memory and counts
/// saves. Useful for embedding and for observing commit behaviour.
#[derive(Debug, Default)]
pub struct MemoryLibraryStore {
    document: Mutex<Option<String>>,
    saves: AtomicUsize,
}

impl MemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already encoded document, which may be malformed.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
            saves: AtomicUsize::new(0),
        }
    }

    /// Starts from the given state without counting it as a save.
    pub fn with_state(state: &LibraryState) -> Result<Self> {
        Ok(Self::with_document(encode_document(state)?))
    }

    /// The encoded document exactly as last saved.
    pub fn snapshot(&self) -> Option<String> {
        lock(&self.document).clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl LibraryStore for MemoryLibraryStore {
    fn load(&self) -> LibraryState {
        let document = lock(&self.document);
        match document.as_deref().map(decode_document::<LibraryState>) {
            Some(Ok(state)) => state.normalized(),
            Some(Err(err)) => {
                warn!(error = %err, "library unreadable, using default state");
                LibraryState::default()
            }
            None => LibraryState::default(),
        }
    }

    fn save(&self, state: &LibraryState) -> Result<()> {
        let encoded = encode_document(state)?;
        *lock(&self.document) = Some(encoded);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Workbook store held in memory.
#[derive(Debug, Default)]
pub struct MemoryWorkbookStore {
    index: Mutex<WorkbookIndex>,
}

impl MemoryWorkbookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkbookStore for MemoryWorkbookStore {
    fn load(&self) -> WorkbookIndex {
        lock(&self.index).clone()
    }

    fn save(&self, index: &WorkbookIndex) -> Result<()> {
        *lock(&self.index) = index.clone();
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

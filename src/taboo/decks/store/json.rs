use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::taboo::decks::error::{DeckError, Result};
use crate::taboo::decks::model::LibraryState;
use crate::taboo::decks::store::{LibraryStore, WorkbookIndex, WorkbookStore};

/// Library document stored as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonLibraryStore {
    path: PathBuf,
}

impl JsonLibraryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LibraryStore for JsonLibraryStore {
    fn load(&self) -> LibraryState {
        match read_document::<LibraryState>(&self.path) {
            Ok(Some(state)) => state.normalized(),
            Ok(None) => LibraryState::default(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "library unreadable, using default state");
                LibraryState::default()
            }
        }
    }

    fn save(&self, state: &LibraryState) -> Result<()> {
        write_document(&self.path, state)?;
        debug!(path = %self.path.display(), decks = state.decks.len(), "library saved");
        Ok(())
    }
}

/// Workbook records stored as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonWorkbookStore {
    path: PathBuf,
}

impl JsonWorkbookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Moves an unreadable index aside so the next save cannot overwrite
    /// the records it still holds.
    fn quarantine(&self) {
        let target = self.path.with_extension("json.corrupt");
        match fs::rename(&self.path, &target) {
            Ok(()) => warn!(target = %target.display(), "unreadable workbook index moved aside"),
            Err(err) => warn!(error = %err, "failed to move unreadable workbook index aside"),
        }
    }
}

impl WorkbookStore for JsonWorkbookStore {
    fn load(&self) -> WorkbookIndex {
        match read_document::<WorkbookIndex>(&self.path) {
            Ok(index) => index.unwrap_or_default(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "workbook index unreadable, starting empty");
                self.quarantine();
                WorkbookIndex::default()
            }
        }
    }

    fn save(&self, index: &WorkbookIndex) -> Result<()> {
        write_document(&self.path, index)?;
        debug!(path = %self.path.display(), workbooks = index.workbooks.len(), "workbook index saved");
        Ok(())
    }
}

/// Decodes a stored document, mapping any decoding failure to
/// [`DeckError::Corrupt`].
pub fn decode_document<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|err| DeckError::Corrupt(err.to_string()))
}

/// Encodes a document the way it is written to disk.
pub fn encode_document<T: Serialize>(document: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|err| DeckError::Corrupt(err.to_string()))?;
    decode_document(&content).map(Some)
}

fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let content = encode_document(document)?;

    // Write next to the target and rename so a crash never leaves a
    // half-written document behind.
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, content)?;
    fs::rename(&staging, path)?;
    Ok(())
}

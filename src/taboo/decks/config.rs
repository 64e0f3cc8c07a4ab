use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::taboo::decks::error::Result;
use crate::taboo::decks::io::sheets::HttpSheetsClient;
use crate::taboo::decks::model::DEFAULT_TABOO_WORDS_PER_CARD;
use crate::taboo::decks::store::{JsonLibraryStore, JsonWorkbookStore};

/// File name of the library document inside the data directory.
pub const LIBRARY_FILE: &str = "library.json";
/// File name of the workbook index inside the data directory.
pub const WORKBOOKS_FILE: &str = "workbooks.json";
/// Fetch timeout used when none is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Runtime settings shared by every command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub sheets_api_key: Option<String>,
    pub fetch_timeout: Duration,
    pub default_taboo_words_per_card: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            sheets_api_key: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            default_taboo_words_per_card: DEFAULT_TABOO_WORDS_PER_CARD,
        }
    }
}

impl Settings {
    pub fn library_path(&self) -> PathBuf {
        self.data_dir.join(LIBRARY_FILE)
    }

    pub fn workbooks_path(&self) -> PathBuf {
        self.data_dir.join(WORKBOOKS_FILE)
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn library_store(&self) -> JsonLibraryStore {
        JsonLibraryStore::new(self.library_path())
    }

    pub fn workbook_store(&self) -> JsonWorkbookStore {
        JsonWorkbookStore::new(self.workbooks_path())
    }

    pub fn http_client(&self) -> Result<HttpSheetsClient> {
        HttpSheetsClient::new(self.fetch_timeout, self.sheets_api_key.clone())
    }
}

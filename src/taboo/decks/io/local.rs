use std::fs;
use std::path::Path;

use tracing::{debug, instrument};

use crate::taboo::decks::error::{DeckError, Result};
use crate::taboo::decks::io::{SpreadsheetClient, WorkbookMeta, excel_read};
use crate::taboo::decks::parse::CellMatrix;

/// Reads decks from the local filesystem: `.csv` files for single decks and
/// `.xlsx` files for multi-tab workbooks. Locators are file paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileClient;

impl LocalFileClient {
    pub fn new() -> Self {
        Self
    }
}

impl SpreadsheetClient for LocalFileClient {
    #[instrument(level = "debug", skip(self))]
    fn fetch_csv(&self, locator: &str) -> Result<String> {
        fs::read_to_string(locator).map_err(|err| DeckError::fetch_failed(locator, err))
    }

    #[instrument(level = "debug", skip(self))]
    fn fetch_workbook_meta(&self, locator: &str) -> Result<WorkbookMeta> {
        let meta = excel_read::read_workbook_meta(Path::new(locator))
            .map_err(|err| DeckError::fetch_failed(locator, err))?;
        debug!(tab_count = meta.tabs.len(), "read local workbook metadata");
        Ok(meta)
    }

    #[instrument(level = "debug", skip(self))]
    fn fetch_tab_values(&self, sheet_id: &str, tab_name: &str) -> Result<CellMatrix> {
        excel_read::read_sheet_values(Path::new(sheet_id), tab_name)
            .map_err(|err| DeckError::fetch_failed(format!("{sheet_id}/{tab_name}"), err))
    }
}

/// Whether a locator names something on the local filesystem rather than
/// a remote spreadsheet.
pub fn is_local_locator(locator: &str) -> bool {
    let trimmed = locator.trim();
    !trimmed.contains("://") && Path::new(trimmed).exists()
}

//! Adapters that fetch spreadsheet content and write decks back out.
//!
//! Every adapter returns raw text or cell matrices; parsing into cards
//! happens in [`crate::taboo::decks::parse`].

pub mod excel_read;
pub mod excel_write;
pub mod local;
pub mod sheets;

use crate::taboo::decks::error::Result;
use crate::taboo::decks::parse::CellMatrix;

/// One tab as listed in a workbook's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabMeta {
    pub title: String,
    pub gid: i64,
}

/// Workbook metadata: external id, title, and ordered tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookMeta {
    pub sheet_id: String,
    pub title: String,
    pub tabs: Vec<TabMeta>,
}

/// Source of spreadsheet content.
///
/// Calls are one-shot: failures of any kind surface as
/// [`DeckError::FetchFailed`](crate::taboo::decks::error::DeckError::FetchFailed)
/// and the caller decides whether to retry the whole operation.
pub trait SpreadsheetClient {
    /// Returns the CSV text of a single tab.
    fn fetch_csv(&self, locator: &str) -> Result<String>;

    /// Returns the title and tab list of a multi-tab workbook.
    fn fetch_workbook_meta(&self, locator: &str) -> Result<WorkbookMeta>;

    /// Returns the row-major cell values of one tab.
    fn fetch_tab_values(&self, sheet_id: &str, tab_name: &str) -> Result<CellMatrix>;
}

/// Sends local file paths to [`local::LocalFileClient`] and everything else
/// to the remote client.
pub struct RoutingClient<R> {
    local: local::LocalFileClient,
    remote: R,
}

impl<R: SpreadsheetClient> RoutingClient<R> {
    pub fn new(remote: R) -> Self {
        Self {
            local: local::LocalFileClient::new(),
            remote,
        }
    }

    fn route(&self, locator: &str) -> &dyn SpreadsheetClient {
        if local::is_local_locator(locator) {
            &self.local
        } else {
            &self.remote
        }
    }
}

impl<R: SpreadsheetClient> SpreadsheetClient for RoutingClient<R> {
    fn fetch_csv(&self, locator: &str) -> Result<String> {
        self.route(locator).fetch_csv(locator)
    }

    fn fetch_workbook_meta(&self, locator: &str) -> Result<WorkbookMeta> {
        self.route(locator).fetch_workbook_meta(locator)
    }

    fn fetch_tab_values(&self, sheet_id: &str, tab_name: &str) -> Result<CellMatrix> {
        self.route(sheet_id).fetch_tab_values(sheet_id, tab_name)
    }
}

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Error type covering the failure cases of fetching, parsing, and
/// persisting decks and workbooks.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Transport error, timeout, non-success status, or malformed payload
    /// from the spreadsheet source.
    #[error("failed to fetch '{locator}': {reason}")]
    FetchFailed { locator: String, reason: String },

    /// The fetch succeeded but no cards could be extracted.
    #[error("no cards found in '{0}' with the expected layout")]
    ParseEmpty(String),

    /// A deck, category, or workbook id is absent.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The caller supplied an argument that violates a library invariant.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller's role may not perform the requested operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The persisted document could not be decoded. Stores recover from this
    /// locally by substituting the default state.
    #[error("corrupt document: {0}")]
    Corrupt(String),

    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when CSV text cannot be decoded.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl DeckError {
    pub(crate) fn fetch_failed(locator: impl Into<String>, reason: impl ToString) -> Self {
        DeckError::FetchFailed {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn deck_not_found(id: impl Into<String>) -> Self {
        DeckError::NotFound {
            kind: "deck",
            id: id.into(),
        }
    }

    pub(crate) fn category_not_found(name: impl Into<String>) -> Self {
        DeckError::NotFound {
            kind: "category",
            id: name.into(),
        }
    }

    pub(crate) fn workbook_not_found(id: impl Into<String>) -> Self {
        DeckError::NotFound {
            kind: "workbook",
            id: id.into(),
        }
    }
}

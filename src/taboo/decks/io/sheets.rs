use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::USER_AGENT;
use reqwest::{IntoUrl, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::taboo::decks::error::{DeckError, Result};
use crate::taboo::decks::io::{SpreadsheetClient, TabMeta, WorkbookMeta};
use crate::taboo::decks::model::UNTITLED_WORKBOOK;
use crate::taboo::decks::parse::CellMatrix;

/// Google Sheets REST endpoint for spreadsheet metadata and values.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DOCS_HOST: &str = "docs.google.com";
const USER_AGENT_VALUE: &str = concat!("taboo-decks/", env!("CARGO_PKG_VERSION"));

/// Fetches CSV exports and workbook data from Google Sheets over HTTP.
pub struct HttpSheetsClient {
    http: Client,
    api_base: String,
    api_key: Option<String>,
}

impl HttpSheetsClient {
    /// Builds a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DeckError::fetch_failed(SHEETS_API_BASE, format!("HTTP client build failed: {err}")))?;
        Ok(Self {
            http,
            api_base: SHEETS_API_BASE.to_string(),
            api_key,
        })
    }

    /// Points metadata and values requests at another API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn get(&self, url: impl IntoUrl, locator: &str) -> Result<Response> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .map_err(|err| DeckError::fetch_failed(locator, err))?;
        ensure_success(response, locator)
    }

    fn get_json(&self, url: Url, locator: &str) -> Result<Value> {
        self.get(url, locator)?
            .json::<Value>()
            .map_err(|err| DeckError::fetch_failed(locator, err))
    }

    fn api_url(&self, sheet_id: &str, tail: &[&str]) -> Result<Url> {
        let mut url =
            Url::parse(&self.api_base).map_err(|err| DeckError::fetch_failed(&self.api_base, err))?;
        url.path_segments_mut()
            .map_err(|_| DeckError::fetch_failed(&self.api_base, "API base cannot carry a path"))?
            .push(sheet_id)
            .extend(tail);
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

impl SpreadsheetClient for HttpSheetsClient {
    #[instrument(level = "debug", skip(self))]
    fn fetch_csv(&self, locator: &str) -> Result<String> {
        let url = csv_export_url(locator);
        debug!(%url, "fetching CSV export");
        self.get(url.as_str(), locator)?
            .text()
            .map_err(|err| DeckError::fetch_failed(locator, err))
    }

    #[instrument(level = "debug", skip(self))]
    fn fetch_workbook_meta(&self, locator: &str) -> Result<WorkbookMeta> {
        let sheet_id = extract_sheet_id(locator)?;
        let url = self.api_url(&sheet_id, &[])?;
        let payload = self.get_json(url, locator)?;
        parse_workbook_metadata(&sheet_id, payload)
    }

    #[instrument(level = "debug", skip(self))]
    fn fetch_tab_values(&self, sheet_id: &str, tab_name: &str) -> Result<CellMatrix> {
        let locator = format!("{sheet_id}/{tab_name}");
        let url = self.api_url(sheet_id, &["values", tab_name])?;
        let payload = self.get_json(url, &locator)?;
        parse_values_payload(&locator, payload)
    }
}

fn ensure_success(response: Response, locator: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(DeckError::fetch_failed(
        locator,
        format!("status {status}: {body}"),
    ))
}

#[derive(Debug, Deserialize)]
struct SpreadsheetPayload {
    #[serde(default)]
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetProperties {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SheetPayload {
    #[serde(default)]
    properties: SheetProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    title: Option<String>,
    sheet_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ValuesPayload {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Converts a Sheets API spreadsheet resource into [`WorkbookMeta`].
///
/// Every tab must carry a title and a numeric id.
pub fn parse_workbook_metadata(sheet_id: &str, payload: Value) -> Result<WorkbookMeta> {
    let payload: SpreadsheetPayload = serde_json::from_value(payload)
        .map_err(|err| DeckError::fetch_failed(sheet_id, format!("malformed workbook metadata: {err}")))?;

    let tabs = payload
        .sheets
        .into_iter()
        .enumerate()
        .map(|(index, sheet)| match (sheet.properties.title, sheet.properties.sheet_id) {
            (Some(title), Some(gid)) => Ok(TabMeta { title, gid }),
            _ => Err(DeckError::fetch_failed(
                sheet_id,
                format!("malformed workbook metadata: tab {index} is missing its title or id"),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(WorkbookMeta {
        sheet_id: sheet_id.to_string(),
        title: payload
            .properties
            .title
            .unwrap_or_else(|| UNTITLED_WORKBOOK.to_string()),
        tabs,
    })
}

/// Converts a Sheets API value range into a row-major cell matrix.
pub fn parse_values_payload(locator: &str, payload: Value) -> Result<CellMatrix> {
    let payload: ValuesPayload = serde_json::from_value(payload)
        .map_err(|err| DeckError::fetch_failed(locator, format!("malformed value range: {err}")))?;

    Ok(payload
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect())
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Extracts the spreadsheet id from a Google Sheets URL. Anything that is
/// not a Google Sheets URL is taken to be the raw id.
pub fn extract_sheet_id(locator: &str) -> Result<String> {
    let trimmed = locator.trim();
    if trimmed.is_empty() {
        return Err(DeckError::InvalidArgument(
            "spreadsheet locator is empty".into(),
        ));
    }
    if !trimmed.contains(DOCS_HOST) {
        return Ok(trimmed.to_string());
    }

    trimmed
        .split_once("/d/")
        .and_then(|(_, rest)| rest.split(['/', '?', '#']).next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DeckError::InvalidArgument(format!("invalid Google Sheets URL: {trimmed}")))
}

/// Editor link to a single tab; stored as the source of workbook decks.
pub fn tab_source_url(sheet_id: &str, gid: i64) -> String {
    format!("https://{DOCS_HOST}/spreadsheets/d/{sheet_id}/edit#gid={gid}")
}

/// Rewrites Google Sheets editor links to their CSV export endpoint.
/// Published, export, and non-Google URLs are returned unchanged.
pub fn csv_export_url(locator: &str) -> String {
    let trimmed = locator.trim();
    let passthrough = !trimmed.contains(DOCS_HOST)
        || trimmed.contains("/d/e/")
        || trimmed.contains("/pub")
        || trimmed.contains("/export")
        || trimmed.contains("/gviz/");
    if passthrough {
        return trimmed.to_string();
    }

    match extract_sheet_id(trimmed) {
        Ok(sheet_id) => {
            let gid = extract_gid(trimmed).unwrap_or(0);
            format!("https://{DOCS_HOST}/spreadsheets/d/{sheet_id}/export?format=csv&gid={gid}")
        }
        Err(_) => trimmed.to_string(),
    }
}

fn extract_gid(locator: &str) -> Option<i64> {
    locator
        .split(['#', '&', '?'])
        .find_map(|part| part.strip_prefix("gid="))
        .and_then(|gid| gid.parse().ok())
}

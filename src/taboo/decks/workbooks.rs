//! Links multi-tab external workbooks to decks in the library.
//!
//! The link is local bookkeeping only: nothing here writes to the external
//! spreadsheet.

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::taboo::decks::error::{DeckError, Result};
use crate::taboo::decks::io::local::is_local_locator;
use crate::taboo::decks::io::sheets::tab_source_url;
use crate::taboo::decks::io::{SpreadsheetClient, TabMeta};
use crate::taboo::decks::model::{
    DEFAULT_TABOO_WORDS_PER_CARD, MAX_TABOO_WORDS_PER_CARD, ParsedTab, ParsedWorkbook,
    SourceType, Tab, Workbook, WorkbookId, group_size_param, widest_card,
};
use crate::taboo::decks::parse::parse_cards;
use crate::taboo::decks::store::{LibraryStore, WorkbookStore};
use crate::taboo::decks::sync::{
    NewDeck, SourceDescriptor, SweepOutcome, SweepReport, import_into, refresh_into,
};

/// Fetches a workbook's metadata and every tab, parsing each tab with the
/// same layout. Any failed fetch fails the whole call.
#[instrument(level = "info", skip(client))]
pub fn fetch_workbook(
    client: &dyn SpreadsheetClient,
    locator: &str,
    taboo_words_per_card: usize,
) -> Result<ParsedWorkbook> {
    let meta = client.fetch_workbook_meta(locator)?;

    let tabs = meta
        .tabs
        .into_iter()
        .map(|tab| {
            let rows = client.fetch_tab_values(&meta.sheet_id, &tab.title)?;
            Ok(ParsedTab {
                cards: parse_cards(&rows, group_size_param(taboo_words_per_card)),
                tab_name: tab.title,
                sheet_gid: tab.gid,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedWorkbook {
        sheet_id: meta.sheet_id,
        name: meta.title,
        tabs,
    })
}

/// Source recorded on a deck created for one workbook tab.
pub fn tab_source(sheet_id: &str, tab: &ParsedTab) -> SourceDescriptor {
    if is_local_locator(sheet_id) {
        SourceDescriptor::new(SourceType::Other, format!("{sheet_id}#{}", tab.tab_name))
    } else {
        SourceDescriptor::new(SourceType::GoogleSheets, tab_source_url(sheet_id, tab.sheet_gid))
    }
}

/// Creates one deck per tab and then stores a workbook record linking every
/// tab to its deck.
///
/// Decks are committed with a single library save before the workbook record
/// is written, so a stored workbook never references a missing deck. Tabs
/// without cards are recorded without a deck.
#[instrument(level = "info", skip_all, fields(sheet_id = %parsed.sheet_id, tabs = parsed.tabs.len()))]
pub fn register(
    library: &dyn LibraryStore,
    workbooks: &dyn WorkbookStore,
    parsed: ParsedWorkbook,
    taboo_words_per_card: usize,
) -> Result<WorkbookId> {
    let layout = taboo_words_per_card.clamp(1, MAX_TABOO_WORDS_PER_CARD);
    let mut state = library.load();
    let mut tabs = Vec::with_capacity(parsed.tabs.len());
    let mut created = Vec::new();

    for tab in parsed.tabs {
        let deck_id = if tab.cards.is_empty() {
            warn!(tab = %tab.tab_name, "tab has no cards, leaving it unlinked");
            None
        } else {
            let source = tab_source(&parsed.sheet_id, &tab);
            let id = import_into(
                &mut state,
                NewDeck {
                    taboo_words_per_card: layout.max(widest_card(&tab.cards).unwrap_or(0)),
                    cards: tab.cards,
                    name: Some(tab.tab_name.clone()),
                    category: None,
                    source,
                },
            )?;
            created.push(id.clone());
            Some(id)
        };

        tabs.push(Tab {
            tab_name: tab.tab_name,
            sheet_gid: tab.sheet_gid,
            deck_id,
        });
    }

    if !created.is_empty() {
        library.save(&state)?;
    }

    let workbook = Workbook {
        id: String::new(),
        external_workbook_id: parsed.sheet_id,
        name: parsed.name,
        tabs,
        last_synced: Some(Utc::now()),
    };

    match workbooks.insert(workbook) {
        Ok(id) => {
            info!(workbook_id = %id, decks = created.len(), "workbook registered");
            Ok(id)
        }
        Err(err) => {
            let ids: Vec<&str> = created.iter().map(String::as_str).collect();
            if let Err(cleanup) = library.delete_decks(&ids) {
                warn!(error = %cleanup, "failed to remove decks of unregistered workbook");
            }
            Err(err)
        }
    }
}

/// Fetches a workbook from its source and registers it.
pub fn register_from_source(
    library: &dyn LibraryStore,
    workbooks: &dyn WorkbookStore,
    client: &dyn SpreadsheetClient,
    locator: &str,
    taboo_words_per_card: usize,
) -> Result<WorkbookId> {
    let parsed = fetch_workbook(client, locator, taboo_words_per_card)?;
    register(library, workbooks, parsed, taboo_words_per_card)
}

/// Re-fetches a registered workbook and refreshes every linked deck.
///
/// Tabs without a linked deck are skipped; reload never creates decks.
/// Per-tab failures are recorded in the report. Deck updates are committed
/// with one library save, and the workbook's last-synced time is updated
/// whatever the tab outcomes.
#[instrument(level = "info", skip(library, workbooks, client))]
pub fn reload(
    library: &dyn LibraryStore,
    workbooks: &dyn WorkbookStore,
    client: &dyn SpreadsheetClient,
    workbook_id: &str,
) -> Result<SweepReport> {
    let workbook = workbooks.get(workbook_id)?;
    let meta = client.fetch_workbook_meta(&workbook.external_workbook_id)?;

    let mut state = library.load();
    let mut report = SweepReport::default();

    for tab in &workbook.tabs {
        let Some(deck_id) = tab.deck_id.as_deref() else {
            report.record(&tab.tab_name, None, SweepOutcome::Skipped {
                reason: "tab is not linked to a deck".into(),
            });
            continue;
        };

        let Some(source_tab) = match_source_tab(&meta.tabs, tab) else {
            warn!(tab = %tab.tab_name, "linked tab no longer exists in the workbook");
            report.record(&tab.tab_name, Some(deck_id), SweepOutcome::Failed {
                reason: "tab no longer exists in the workbook".into(),
            });
            continue;
        };

        let layout = state
            .find_deck(deck_id)
            .map(|deck| deck.taboo_words_per_card)
            .unwrap_or(DEFAULT_TABOO_WORDS_PER_CARD);

        let outcome = match client.fetch_tab_values(&meta.sheet_id, &source_tab.title) {
            Ok(rows) => {
                let cards = parse_cards(&rows, group_size_param(layout));
                if cards.is_empty() {
                    let err = DeckError::ParseEmpty(source_tab.title.clone());
                    warn!(tab = %tab.tab_name, error = %err, "tab reload produced no cards");
                    SweepOutcome::Failed {
                        reason: err.to_string(),
                    }
                } else {
                    let card_count = cards.len();
                    if refresh_into(&mut state, deck_id, cards) {
                        SweepOutcome::Updated { card_count }
                    } else {
                        SweepOutcome::Skipped {
                            reason: "linked deck no longer exists".into(),
                        }
                    }
                }
            }
            Err(err) => {
                warn!(tab = %tab.tab_name, error = %err, "failed to reload tab");
                SweepOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };
        report.record(&tab.tab_name, Some(deck_id), outcome);
    }

    if report.updated_count() > 0 {
        library.save(&state)?;
    }
    workbooks.touch_last_synced(workbook_id, Utc::now())?;

    info!(
        updated = report.updated_count(),
        failed = report.failed_count(),
        "workbook reloaded"
    );
    Ok(report)
}

/// Tabs are matched by numeric id first, then by name, so renamed tabs stay
/// linked.
fn match_source_tab<'a>(source_tabs: &'a [TabMeta], tab: &Tab) -> Option<&'a TabMeta> {
    source_tabs
        .iter()
        .find(|candidate| candidate.gid == tab.sheet_gid)
        .or_else(|| source_tabs.iter().find(|candidate| candidate.title == tab.tab_name))
}

/// Deletes every deck linked from the workbook and then the workbook record.
/// Returns how many decks were removed.
#[instrument(level = "info", skip(library, workbooks))]
pub fn remove(
    library: &dyn LibraryStore,
    workbooks: &dyn WorkbookStore,
    workbook_id: &str,
) -> Result<usize> {
    let workbook = workbooks.get(workbook_id)?;
    let deck_ids: Vec<&str> = workbook.linked_deck_ids().collect();

    let removed = library.delete_decks(&deck_ids)?;
    workbooks.delete(workbook_id)?;

    info!(removed, "workbook removed");
    Ok(removed)
}

pub fn list_workbooks(workbooks: &dyn WorkbookStore) -> Vec<Workbook> {
    workbooks.list()
}

pub fn get_workbook(workbooks: &dyn WorkbookStore, workbook_id: &str) -> Result<Workbook> {
    workbooks.get(workbook_id)
}

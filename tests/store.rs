mod common;

use std::fs;

use common::{card, deck};
use taboo_decks::DeckError;
use taboo_decks::model::{LibraryState, UNCATEGORIZED, Workbook, Tab};
use taboo_decks::store::{
    JsonLibraryStore, JsonWorkbookStore, LibraryStore, MemoryLibraryStore, MemoryWorkbookStore,
    WorkbookStore,
};
use tempfile::tempdir;

fn seeded_store() -> MemoryLibraryStore {
    let state = LibraryState {
        categories: vec![UNCATEGORIZED.to_string(), "Family".to_string(), "Party".to_string()],
        decks: vec![
            deck("d1", "Family", "https://example.com/d1.csv", vec![card("Cat", &["Pet"])]),
            deck("d2", "Party", "https://example.com/d2.csv", vec![card("Dog", &["Bark"])]),
            deck("d3", "Family", "", vec![card("Fish", &["Water"])]),
        ],
    };
    MemoryLibraryStore::with_state(&state).expect("store seeded")
}

#[test]
fn missing_document_loads_default_state() {
    let temp_dir = tempdir().expect("temporary directory");
    let store = JsonLibraryStore::new(temp_dir.path().join("library.json"));

    let state = store.load();

    assert_eq!(state, LibraryState::default());
    assert_eq!(state.categories, vec![UNCATEGORIZED.to_string()]);
    assert!(state.decks.is_empty());
}

#[test]
fn corrupt_document_is_recovered_as_default_state() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("library.json");
    fs::write(&path, "{ \"categories\": [\"Uncategorized\"], \"decks\": [").expect("written");
    let store = JsonLibraryStore::new(&path);

    assert_eq!(store.load(), LibraryState::default());

    let memory = MemoryLibraryStore::with_document("not json at all");
    assert_eq!(memory.load(), LibraryState::default());
}

#[test]
fn json_store_persists_the_whole_document() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("nested").join("library.json");
    let store = JsonLibraryStore::new(&path);

    store
        .upsert_deck(deck("d1", "Travel", "https://example.com/d1.csv", vec![card("Map", &["Route"])]))
        .expect("deck stored");

    let reopened = JsonLibraryStore::new(&path).load();
    assert_eq!(reopened.decks.len(), 1);
    assert_eq!(reopened.decks[0].cards, vec![card("Map", &["Route"])]);
    assert!(reopened.has_category("Travel"));

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("file read")).expect("JSON parsed");
    assert_eq!(raw["decks"][0]["source_type"], "csv");
    assert_eq!(raw["decks"][0]["cards"][0]["word"], "Map");
    assert_eq!(raw["decks"][0]["cards"][0]["taboo"][0], "Route");
}

#[test]
fn loading_repairs_library_invariants() {
    let document = serde_json::json!({
        "categories": ["Party"],
        "decks": [{
            "id": "d1",
            "name": "Legacy",
            "category": "Old",
            "card_count": 99,
            "source_type": "google_sheets",
            "source": "https://docs.google.com/spreadsheets/d/abc/edit",
            "cards": [{"word": "Cat", "taboo": ["Pet"]}]
        }]
    });
    let store = MemoryLibraryStore::with_document(document.to_string());

    let state = store.load();

    assert_eq!(state.categories, vec![UNCATEGORIZED, "Party", "Old"]);
    assert_eq!(state.decks[0].card_count, 1);
    assert_eq!(state.decks[0].taboo_words_per_card, 4);
}

#[test]
fn loading_keeps_large_layouts_and_lifts_zero_layouts() {
    let document = serde_json::json!({
        "categories": [UNCATEGORIZED],
        "decks": [
            {
                "id": "huge",
                "name": "Huge",
                "category": UNCATEGORIZED,
                "card_count": 1,
                "source_type": "csv",
                "source": "https://example.com/huge.csv",
                "taboo_words_per_card": u64::MAX,
                "cards": [{"word": "Cat", "taboo": ["Pet"]}]
            },
            {
                "id": "zero",
                "name": "Zero",
                "category": UNCATEGORIZED,
                "card_count": 1,
                "source_type": "csv",
                "source": "https://example.com/zero.csv",
                "taboo_words_per_card": 0,
                "cards": [{"word": "Dog", "taboo": ["Bark"]}]
            }
        ]
    });
    let store = MemoryLibraryStore::with_document(document.to_string());

    let state = store.load();

    assert_eq!(state.find_deck("huge").map(|d| d.taboo_words_per_card), Some(usize::MAX));
    assert_eq!(state.find_deck("zero").map(|d| d.taboo_words_per_card), Some(1));
}

#[test]
fn upsert_inserts_then_replaces() {
    let store = seeded_store();

    store
        .upsert_deck(deck("d4", "Family", "", vec![card("Owl", &["Night"])]))
        .expect("inserted");
    let mut replacement = deck("d1", "Family", "", vec![card("Lion", &["Roar"])]);
    replacement.name = "Renamed".to_string();
    let state = store.upsert_deck(replacement).expect("replaced");

    assert_eq!(state.decks.len(), 4);
    let d1 = state.find_deck("d1").expect("d1 present");
    assert_eq!(d1.name, "Renamed");
    assert_eq!(d1.cards, vec![card("Lion", &["Roar"])]);
    assert_eq!(state.decks[0].id, "d1");
}

#[test]
fn deleting_a_missing_deck_is_a_no_op_unless_strict() {
    let store = seeded_store();
    let before = store.snapshot();

    let state = store.delete_deck("missing").expect("no-op delete");
    assert_eq!(state.decks.len(), 3);
    assert_eq!(store.snapshot(), before);
    assert_eq!(store.save_count(), 0);

    let err = store.delete_deck_strict("missing").expect_err("strict delete fails");
    assert!(matches!(err, DeckError::NotFound { kind: "deck", .. }));

    let state = store.delete_deck_strict("d2").expect("deck deleted");
    assert!(state.find_deck("d2").is_none());
    assert_eq!(store.load().decks.len(), 2);
}

#[test]
fn add_category_is_idempotent() {
    let store = seeded_store();

    store.add_category("  Kids ").expect("added");
    let state = store.add_category("Kids").expect("added again");

    assert_eq!(state.categories.iter().filter(|c| *c == "Kids").count(), 1);
    assert_eq!(store.save_count(), 1);

    let err = store.add_category("   ").expect_err("empty name rejected");
    assert!(matches!(err, DeckError::InvalidArgument(_)));
}

#[test]
fn deleting_a_category_moves_its_decks_to_uncategorized() {
    let store = seeded_store();

    let state = store.delete_category("Family").expect("category deleted");

    assert!(!state.has_category("Family"));
    assert!(state.decks.iter().all(|deck| deck.category != "Family"));
    assert_eq!(state.find_deck("d1").map(|d| d.category.as_str()), Some(UNCATEGORIZED));
    assert_eq!(state.find_deck("d3").map(|d| d.category.as_str()), Some(UNCATEGORIZED));
    assert_eq!(state.find_deck("d2").map(|d| d.category.as_str()), Some("Party"));
    assert_eq!(store.load(), state);
}

#[test]
fn uncategorized_cannot_be_deleted() {
    let store = seeded_store();
    let before = store.snapshot();

    let err = store
        .delete_category(UNCATEGORIZED)
        .expect_err("permanent category");
    assert!(matches!(err, DeckError::InvalidArgument(_)));

    let err = store.delete_category("Nope").expect_err("absent category");
    assert!(matches!(err, DeckError::NotFound { kind: "category", .. }));
    assert_eq!(store.snapshot(), before);
}

#[test]
fn moving_to_an_unknown_category_leaves_the_library_unchanged() {
    let store = seeded_store();
    let before = store.snapshot().expect("seeded document");

    let err = store
        .move_deck_category("d1", "Nowhere")
        .expect_err("unknown category");

    assert!(matches!(err, DeckError::InvalidArgument(_)));
    assert_eq!(store.snapshot().expect("document"), before);
    assert_eq!(store.save_count(), 0);
}

#[test]
fn moving_a_deck_between_known_categories() {
    let store = seeded_store();

    let err = store
        .move_deck_category("missing", "Party")
        .expect_err("missing deck");
    assert!(matches!(err, DeckError::NotFound { kind: "deck", .. }));

    let state = store.move_deck_category("d1", "Party").expect("moved");
    assert_eq!(state.find_deck("d1").map(|d| d.category.as_str()), Some("Party"));
}

#[test]
fn delete_decks_saves_once() {
    let store = seeded_store();

    let removed = store.delete_decks(&["d1", "d3", "missing"]).expect("deleted");

    assert_eq!(removed, 2);
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.load().decks.len(), 1);
}

fn sample_workbook(name: &str) -> Workbook {
    Workbook {
        id: String::new(),
        external_workbook_id: "sheet-1".to_string(),
        name: name.to_string(),
        tabs: vec![Tab {
            tab_name: "Animals".to_string(),
            sheet_gid: 0,
            deck_id: Some("d1".to_string()),
        }],
        last_synced: None,
    }
}

#[test]
fn workbook_store_assigns_ids_and_deletes() {
    let temp_dir = tempdir().expect("temporary directory");
    let store = JsonWorkbookStore::new(temp_dir.path().join("workbooks.json"));

    let first = store.insert(sample_workbook("First")).expect("inserted");
    let second = store.insert(sample_workbook("Second")).expect("inserted");
    assert_ne!(first, second);

    let reopened = JsonWorkbookStore::new(temp_dir.path().join("workbooks.json"));
    assert_eq!(reopened.get(&first).expect("found").name, "First");
    assert_eq!(reopened.list().len(), 2);

    reopened.delete(&first).expect("deleted");
    assert!(matches!(
        reopened.get(&first),
        Err(DeckError::NotFound { kind: "workbook", .. })
    ));
    assert!(matches!(
        reopened.delete(&first),
        Err(DeckError::NotFound { kind: "workbook", .. })
    ));
}

#[test]
fn corrupt_workbook_index_is_moved_aside_before_it_is_overwritten() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("workbooks.json");
    fs::write(&path, "[[[").expect("written");
    let store = JsonWorkbookStore::new(&path);

    assert!(store.list().is_empty());
    let id = store.insert(sample_workbook("Fresh")).expect("inserted");

    let preserved = temp_dir.path().join("workbooks.json.corrupt");
    assert_eq!(fs::read_to_string(&preserved).expect("corrupt copy kept"), "[[[");
    assert_eq!(store.get(&id).expect("found").name, "Fresh");
    assert!(MemoryWorkbookStore::new().list().is_empty());
}

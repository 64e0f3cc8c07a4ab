use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use taboo_decks::config::Settings;
use taboo_decks::io::RoutingClient;
use taboo_decks::io::excel_write::{self, DEFAULT_CARDS_PER_COLUMN};
use taboo_decks::model::DEFAULT_TABOO_WORDS_PER_CARD;
use taboo_decks::store::{LibraryStore, WorkbookStore};
use taboo_decks::sync::{self, ImportRequest};
use taboo_decks::{Result, access, logging, workbooks};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = logging::init(&cli.global.log_level) {
        eprintln!("warning: {error}");
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = cli.global.into_settings();
    settings.ensure_data_dir()?;
    let library = settings.library_store();
    let workbook_store = settings.workbook_store();

    match cli.command {
        Command::Library(LibraryCommand::Show) => print_json(&library.load()),
        Command::Decks(command) => run_decks(&settings, &library, command),
        Command::Categories(command) => match command {
            CategoryCommand::Add { name } => print_json(&library.add_category(&name)?),
            CategoryCommand::Delete { name } => print_json(&library.delete_category(&name)?),
        },
        Command::Workbooks(command) => run_workbooks(&settings, &library, &workbook_store, command),
    }
}

fn run_decks(settings: &Settings, library: &dyn LibraryStore, command: DeckCommand) -> Result<()> {
    match command {
        DeckCommand::Import {
            url,
            name,
            category,
            taboo_words,
        } => {
            let client = RoutingClient::new(settings.http_client()?);
            sync::import_from_source(
                library,
                &client,
                ImportRequest {
                    url,
                    name,
                    category,
                    taboo_words_per_card: taboo_words,
                },
            )?;
            print_json(&library.load())
        }
        DeckCommand::Refresh => {
            let client = RoutingClient::new(settings.http_client()?);
            print_json(&sync::refresh_from_source(library, &client)?)
        }
        DeckCommand::Delete { id } => print_json(&library.delete_deck_strict(&id)?),
        DeckCommand::Move { id, category } => {
            print_json(&library.move_deck_category(&id, &category)?)
        }
        DeckCommand::Export {
            output,
            cards_per_column,
        } => {
            let state = library.load();
            excel_write::export_decks(&output, &state.decks, cards_per_column)
        }
    }
}

fn run_workbooks(
    settings: &Settings,
    library: &dyn LibraryStore,
    workbook_store: &dyn WorkbookStore,
    command: WorkbookCommand,
) -> Result<()> {
    match command {
        WorkbookCommand::List => print_json(&workbooks::list_workbooks(workbook_store)),
        WorkbookCommand::Add { locator, role } => {
            access::require_privileged(&role.role)?;
            let client = RoutingClient::new(settings.http_client()?);
            let id = workbooks::register_from_source(
                library,
                workbook_store,
                &client,
                &locator,
                settings.default_taboo_words_per_card,
            )?;
            print_json(&workbooks::get_workbook(workbook_store, &id)?)
        }
        WorkbookCommand::Reload { id, role } => {
            access::require_privileged(&role.role)?;
            let client = RoutingClient::new(settings.http_client()?);
            print_json(&workbooks::reload(library, workbook_store, &client, &id)?)
        }
        WorkbookCommand::Remove { id, role } => {
            access::require_privileged(&role.role)?;
            let removed = workbooks::remove(library, workbook_store, &id)?;
            print_json(&serde_json::json!({ "workbook_id": id, "decks_removed": removed }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Manage a library of taboo card decks synced from spreadsheets."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// Directory holding library.json and workbooks.json.
    #[arg(long, env = "TABOO_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Google Sheets API key used for workbook metadata and values.
    #[arg(long, env = "GOOGLE_SHEETS_API_KEY", global = true, hide_env_values = true)]
    sheets_api_key: Option<String>,

    /// Timeout for each spreadsheet fetch, in seconds.
    #[arg(long, env = "TABOO_FETCH_TIMEOUT_SECS", default_value_t = 20, global = true)]
    timeout_secs: u64,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

impl GlobalArgs {
    fn into_settings(self) -> Settings {
        Settings {
            data_dir: self.data_dir,
            sheets_api_key: self.sheets_api_key.filter(|key| !key.trim().is_empty()),
            fetch_timeout: Duration::from_secs(self.timeout_secs.max(1)),
            default_taboo_words_per_card: DEFAULT_TABOO_WORDS_PER_CARD,
        }
    }
}

#[derive(Args)]
struct RoleArgs {
    /// Pre-validated caller role (staff, admin, or dev).
    #[arg(long)]
    role: String,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect the library.
    #[command(subcommand)]
    Library(LibraryCommand),

    /// Import, refresh, and organise decks.
    #[command(subcommand)]
    Decks(DeckCommand),

    /// Manage deck categories.
    #[command(subcommand)]
    Categories(CategoryCommand),

    /// Link multi-tab workbooks to decks.
    #[command(subcommand)]
    Workbooks(WorkbookCommand),
}

#[derive(Subcommand)]
enum LibraryCommand {
    /// Print every category and deck.
    Show,
}

#[derive(Subcommand)]
enum DeckCommand {
    /// Import a deck from a CSV URL, Google Sheets link, or local CSV file.
    Import {
        url: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Taboo rows below each headword in the sheet layout.
        #[arg(long, default_value_t = DEFAULT_TABOO_WORDS_PER_CARD as i64)]
        taboo_words: i64,
    },

    /// Re-fetch every deck from its source.
    Refresh,

    /// Delete a deck.
    Delete { id: String },

    /// Move a deck into an existing category.
    Move { id: String, category: String },

    /// Write every deck to an .xlsx workbook, one sheet per deck.
    Export {
        output: PathBuf,

        #[arg(long, default_value_t = DEFAULT_CARDS_PER_COLUMN)]
        cards_per_column: usize,
    },
}

#[derive(Subcommand)]
enum CategoryCommand {
    Add { name: String },
    Delete { name: String },
}

#[derive(Subcommand)]
enum WorkbookCommand {
    /// Import every tab of a workbook as its own deck.
    Add {
        locator: String,

        #[command(flatten)]
        role: RoleArgs,
    },

    List,

    /// Refresh the decks linked to a workbook.
    Reload {
        id: String,

        #[command(flatten)]
        role: RoleArgs,
    },

    /// Delete a workbook and its linked decks. The spreadsheet is untouched.
    Remove {
        id: String,

        #[command(flatten)]
        role: RoleArgs,
    },
}

use tracing_subscriber::EnvFilter;

use crate::taboo::decks::error::{DeckError, Result};

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over
/// `default_filter`. Output goes to stderr so command output stays clean.
pub fn init(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|err| DeckError::Logging(err.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| DeckError::Logging(err.to_string()))
}

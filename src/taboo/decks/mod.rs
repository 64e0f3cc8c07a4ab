pub mod access;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod parse;
pub mod store;
pub mod sync;
pub mod workbooks;

pub use error::{DeckError, Result};

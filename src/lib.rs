//! Core library for the taboo-decks command line application.
//!
//! The library keeps a persisted collection of taboo card decks in sync with
//! the spreadsheets they were imported from. Fetch adapters live under
//! [`taboo::decks::io`], data representations in [`taboo::decks::model`], the
//! column-oriented card parser in [`taboo::decks::parse`], persistence under
//! [`taboo::decks::store`], and the orchestration of imports, refreshes, and
//! linked workbooks in [`taboo::decks::sync`] and [`taboo::decks::workbooks`].

pub mod taboo;

pub use taboo::decks::{
    DeckError, Result, access, config, error, io, logging, model, parse, store, sync, workbooks,
};

//! Navigation for static HTML slide decks.
//!
//! [`Deck`] is the controller: it owns the deck state (active slide, overview,
//! mobile mode, theme) and applies every change through [`Deck::update`] to a
//! render target implementing [`view::DeckView`]. The `web` feature binds it to
//! the browser DOM; [`document::MemoryDocument`] binds it to a scanned HTML
//! file for tests and the command-line tool.

pub mod config;
pub mod deck;
pub mod document;
pub mod fragment;
pub mod input;
pub mod store;
pub mod theme;
pub mod view;
#[cfg(feature = "web")]
pub mod web;

pub use deck::{Action, Deck, DeckOptions, DeckState};
pub use theme::Theme;

//! Parsing, linting, and static HTML rendering for markdown slide decks.
//!
//! Text goes through [`parse`] into an immutable [`Deck`], which is then
//! either checked with [`validate`] against a [`RuleSet`] or turned into a
//! standalone HTML page with [`render`].

pub mod error;
pub mod parser;
pub mod render;
pub mod rules;
pub mod types;
pub mod validate;

pub use error::{Error, Result};
pub use parser::{parse, DeckParser};
pub use render::{prepare, render, Pipeline, Renderer, Rule, Scope, Shielded, Stage};
pub use rules::{RuleSet, SlidePredicate, DEFAULT_MAX_CONTENT_LINES};
pub use types::{
    CodeBlock, Deck, Embed, EmbedKind, FrontMatter, Heading, MediaKind, MediaRef, ParseDefect,
    Slide, SLIDE_DELIMITER, SLIDE_DELIMITER_CRLF,
};
pub use validate::{validate, Finding, RuleId, Severity, ValidationReport};

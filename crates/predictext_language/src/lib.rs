//! Text segmentation and multi-token pattern folding.
//!
//! This crate turns raw text into the token stream the rest of the engine
//! consumes, in two passes:
//!
//! 1. [`Tokenizer`] splits characters into word and separator tokens using
//!    the fixed separator alphabet of `predictext-base`. It is context-free
//!    and order-preserving: the emitted sequence does not depend on how the
//!    input is chunked.
//! 2. [`TokenConverter`] folds multi-token patterns (dates, numbers,
//!    percents, acronyms, hyphenated compounds, apostrophe groups) into
//!    single tokens, trying [`PatternMatcher`]s in a fixed priority order.
//!
//! A [`LanguageModel`] supplies the language-specific material: month and
//! weekday names, apostrophe compounds, and the two matcher presets
//! (*semantic*, the full list; *n-gram*, the subset used when training and
//! querying the n-gram dictionaries). [`FrenchModel`] is the built-in
//! preset, with its resources embedded from `assets/french.json`.

mod converter;
mod matcher;
mod model;
mod tokenizer;

pub use converter::{convert_tokens, TokenConverter};
pub use matcher::{PatternMatch, PatternMatcher};
pub use model::{FrenchModel, LanguageModel};
pub use tokenizer::{tokenize_str, Tokenizer};

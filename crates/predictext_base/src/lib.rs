//! Structural atoms shared by every predictext crate.
//!
//! This crate defines the token model the whole pipeline speaks:
//!
//! - [`Token`]: the tagged sum of words, separators, equivalence classes
//!   and control tags produced by the tokenizer and consumed everywhere else
//! - [`SeparatorKind`]: the fixed separator alphabet with its classification
//!   flags (sentence boundary, word-internal)
//! - [`EquivalenceClassId`] / [`TagId`]: the reserved low word-id band
//! - [`TokenReader`] / [`TokenWriter`]: the binary token stream codec used
//!   for intermediate training artifacts
//! - [`PredictError`]: the shared error type
//!
//! Nothing here performs I/O beyond the codec; there are no dependencies on
//! the dictionary or trie crates.

mod codec;
mod equivalence;
mod error;
mod separator;
mod tag;
mod token;

pub use codec::{TokenReader, TokenSource, TokenWriter};
pub use equivalence::EquivalenceClassId;
pub use error::{PredictError, Result};
pub use separator::SeparatorKind;
pub use tag::TagId;
pub use token::Token;

/// Integer identifier of a word inside a word dictionary.
///
/// Ids `0..=15` are reserved for equivalence classes, `16` and `17` for the
/// START and UNKNOWN tags; regular vocabulary starts at [`FIRST_WORD_ID`].
pub type WordId = i32;

/// First id handed out to a regular vocabulary word.
pub const FIRST_WORD_ID: WordId = 18;

//! Word vocabulary for the prediction engine.
//!
//! The [`WordDictionary`] is the bidirectional `text ↔ id` mapping every
//! other component speaks through: tokens resolve to word ids here, the
//! n-gram tries store nothing but those ids, and predictions resolve back
//! to surfaces for display.
//!
//! - [`Word`]: tagged sum of simple (corpus) words, user words added at
//!   runtime, equivalence-class words and tag words
//! - [`WordDictionaryBuilder`]: applies the corpus case policy (directly
//!   valid / unknown / upper-case replacement / base-dictionary casing) to
//!   counted surfaces
//! - [`BaseWordDictionary`]: the JSON reference lexicon with per-form
//!   frequencies consulted by the case policy
//! - [`NextWord`] / [`BiIntegerKey`]: candidate payloads shared with the
//!   prefix detector and predictor
//! - dictionary files are gzip streams of word records
//!   ([`codec`])

pub mod codec;

mod base_words;
mod builder;
mod dictionary;
mod next_word;
mod word;

pub use base_words::BaseWordDictionary;
pub use builder::{CasePolicy, WordDictionaryBuilder};
pub use dictionary::WordDictionary;
pub use next_word::{BiIntegerKey, NextWord};
pub use word::{SimpleWord, UserWord, Word};

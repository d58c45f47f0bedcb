//! N-gram trie dictionaries.
//!
//! One logical structure, two shapes:
//!
//! - [`DynamicNGramDictionary`]: fully in-memory, mutable, used during
//!   training and for the per-user model. Nodes live in a `u32`-indexed
//!   arena; each node's children sit in a compact open-addressed
//!   [`TrieNodeMap`].
//! - [`StaticNGramDictionary`]: read-only, memory-mapped, used as the
//!   baseline model at prediction time. Unigrams are materialized on open;
//!   deeper child blocks are binary-searched directly in the mapped file.
//!
//! Both implement [`NGramDictionary`], which carries the shared probability
//! model: absolute discounting with per-order discounts and back-off
//! interpolation down to the unigram level. Smoothing, discount estimation
//! and the pruning methods live in [`smoothing`] and [`pruning`].

mod dynamic;
mod format;
mod map;
mod pruning;
mod smoothing;
mod static_dict;
mod trie;

pub use dynamic::DynamicNGramDictionary;
pub use map::TrieNodeMap;
pub use pruning::{prune as prune_dictionary, PruningMethod};
pub use smoothing::SmoothingConfig;
pub use static_dict::StaticNGramDictionary;
pub use trie::NGramDictionary;

/// Default discount applied when a dynamic dictionary is opened without
/// explicitly estimated discounts.
pub const DEFAULT_DISCOUNT: f64 = 0.5;

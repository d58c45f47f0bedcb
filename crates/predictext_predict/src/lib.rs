//! Prefix detection, correction rules and the word predictor.
//!
//! The [`WordPredictor`] owns the loaded models: the word dictionary, the
//! static baseline n-gram dictionary and, once the user has typed, an
//! in-memory dynamic n-gram dictionary blended in at a configurable
//! mixture. A prediction call tokenizes and folds the input, detects the
//! started word prefix ([`detect_word_prefix`]), gathers candidates across
//! n-gram orders, scores, deduplicates and ranks them.
//!
//! Spelling-correction expansion is driven by a [`CorrectionRuleNode`]
//! tree; the built-in [`CorrectionRuleNode::accents`] preset recovers
//! accented French prefixes from unaccented typing.

mod correction;
mod parameter;
mod prefix;
mod predictor;

pub use correction::{CorrectionRule, CorrectionRuleNode};
pub use parameter::PredictionParameter;
pub use prefix::{detect_word_prefix, WordPrefixDetected};
pub use predictor::{Prediction, PredictionResult, WordPredictor};

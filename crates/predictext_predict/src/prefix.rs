//! Started-word prefix detection.
//!
//! Scans backwards from the end of the token stream, stitching word tokens
//! and word-internal separators (apostrophe, hyphen) into candidate prefix
//! strings, and keeps the longest one that at least one dictionary word
//! extends — preferring more trailing tokens over fewer, so `New-` beats
//! `New` when both have candidates. Dictionary lookup is case-insensitive,
//! which also covers the sentence-initial capitalized form.

use rustc_hash::{FxHashMap, FxHashSet};

use predictext_base::{Token, WordId};
use predictext_lexicon::{BiIntegerKey, NextWord, WordDictionary};

use crate::correction::CorrectionRuleNode;
use crate::parameter::PredictionParameter;

/// Longest trailing run considered part of one started word.
const MAX_PREFIX_TOKENS: usize = 8;

/// A detected unfinished word at the end of the input.
#[derive(Debug)]
pub struct WordPrefixDetected {
    /// The stitched prefix, original casing preserved.
    pub longest_word_prefix: String,
    /// How many trailing tokens the prefix consumes.
    pub token_count: usize,
    /// Vocabulary words extending the prefix (corrections included).
    pub words: FxHashMap<BiIntegerKey, NextWord>,
}

/// Detects the started word at the end of `tokens`, or `None` when the
/// input ends on a non-word-internal separator (no word is in progress).
pub fn detect_word_prefix(
    tokens: &[Token],
    dictionary: &WordDictionary,
    parameter: &PredictionParameter,
    correction: Option<&CorrectionRuleNode>,
    exclusions: &FxHashSet<WordId>,
    wanted: usize,
) -> Option<WordPrefixDetected> {
    let last = tokens.last()?;
    if last.is_separator() && !last.is_word_internal_separator() {
        return None;
    }

    // The trailing run of word tokens and word-internal separators.
    let run_start = tokens
        .iter()
        .rposition(|t| !t.is_word() && !t.is_word_internal_separator())
        .map(|i| i + 1)
        .unwrap_or(0);
    let run = &tokens[run_start..];
    if run.is_empty() {
        return None;
    }
    let run = &run[run.len().saturating_sub(MAX_PREFIX_TOKENS)..];

    // Longest stitched prefix with at least one extending word wins.
    for take in (1..=run.len()).rev() {
        let prefix = stitch(&run[run.len() - take..]);
        if prefix.is_empty() {
            continue;
        }
        let mut words = dictionary
            .valid_words_for_prediction_by_prefix(
                &prefix,
                exclusions,
                wanted,
                parameter.min_use_count_to_validate_new_word,
            )
            .unwrap_or_default();

        if parameter.enable_word_correction {
            if let Some(root) = correction {
                merge_corrections(
                    &mut words,
                    root,
                    &prefix,
                    dictionary,
                    parameter,
                    exclusions,
                    wanted,
                );
            }
        }

        if !words.is_empty() {
            return Some(WordPrefixDetected {
                longest_word_prefix: prefix,
                token_count: take,
                words,
            });
        }
    }
    None
}

fn stitch(tokens: &[Token]) -> String {
    let mut prefix = String::new();
    for token in tokens {
        match token {
            Token::Word(text) => prefix.push_str(text),
            Token::Separator(sep) if sep.is_word_internal() => prefix.push(sep.as_char()),
            _ => {}
        }
    }
    prefix
}

fn merge_corrections(
    words: &mut FxHashMap<BiIntegerKey, NextWord>,
    root: &CorrectionRuleNode,
    prefix: &str,
    dictionary: &WordDictionary,
    parameter: &PredictionParameter,
    exclusions: &FxHashSet<WordId>,
    wanted: usize,
) {
    for (alternative, cost) in root.alternative_prefixes(prefix, parameter.correction_max_cost) {
        let found = dictionary
            .valid_words_for_prediction_by_prefix(
                &alternative,
                exclusions,
                wanted,
                parameter.min_use_count_to_validate_new_word,
            )
            .unwrap_or_default();
        for (key, mut next) in found {
            next.correction_cost = cost;
            match words.get_mut(&key) {
                Some(existing) => existing.merge(&next),
                None => {
                    words.insert(key, next);
                }
            }
        }
    }
}

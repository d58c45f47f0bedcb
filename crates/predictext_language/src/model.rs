//! Language models: the language-specific material behind tokenization
//! and pattern folding.
//!
//! A language model carries no algorithm; it supplies word lists and builds
//! the two matcher presets. The French preset embeds its resource file at
//! compile time and parses it once on construction.

use std::collections::HashSet;

use serde::Deserialize;

use crate::matcher::PatternMatcher;

const FRENCH_JSON: &str = include_str!("../assets/french.json");

/// Language-specific resources consumed by the tokenizer and converter.
pub trait LanguageModel: Send + Sync {
    /// Short language tag ("fr").
    fn name(&self) -> &str;

    /// Average word length in characters; sizes tokenizer buffers and has
    /// no semantic effect.
    fn average_word_length(&self) -> usize;

    /// Lowercase month names, January first.
    fn month_names(&self) -> &[String];

    /// Lowercase weekday names, Monday first.
    fn weekday_names(&self) -> &[String];

    /// Compound words containing an apostrophe, lowercase, with a straight
    /// apostrophe (`aujourd'hui`).
    fn special_words(&self) -> &HashSet<String>;

    /// Words excluded from proper-name folding (articles, prepositions).
    fn stop_words(&self) -> &HashSet<String>;

    /// The full matcher list, in priority order.
    fn semantic_matchers(&self) -> Vec<PatternMatcher>;

    /// The matcher subset used for the n-gram domain, in priority order.
    fn ngram_matchers(&self) -> Vec<PatternMatcher>;
}

/// Deserialized shape of a language resource file.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageData {
    name: String,
    average_word_length: usize,
    months: Vec<String>,
    weekdays: Vec<String>,
    special_words: Vec<String>,
}

/// The built-in French language model.
pub struct FrenchModel {
    data: LanguageData,
    special_words: HashSet<String>,
    stop_words: HashSet<String>,
}

impl FrenchModel {
    /// Parses the embedded French resources.
    pub fn new() -> Self {
        let data: LanguageData =
            serde_json::from_str(FRENCH_JSON).expect("embedded french.json is well-formed");
        let special_words = data.special_words.iter().cloned().collect();
        FrenchModel {
            data,
            special_words,
            stop_words: HashSet::new(),
        }
    }

    /// Replaces the stop-word list (one lowercase word per entry).
    ///
    /// Stop words are never folded into proper names.
    pub fn set_stop_words(&mut self, words: impl IntoIterator<Item = String>) {
        self.stop_words = words.into_iter().map(|w| w.to_lowercase()).collect();
    }
}

impl Default for FrenchModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageModel for FrenchModel {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn average_word_length(&self) -> usize {
        self.data.average_word_length
    }

    fn month_names(&self) -> &[String] {
        &self.data.months
    }

    fn weekday_names(&self) -> &[String] {
        &self.data.weekdays
    }

    fn special_words(&self) -> &HashSet<String> {
        &self.special_words
    }

    fn stop_words(&self) -> &HashSet<String> {
        &self.stop_words
    }

    fn semantic_matchers(&self) -> Vec<PatternMatcher> {
        PatternMatcher::semantic_preset(self)
    }

    fn ngram_matchers(&self) -> Vec<PatternMatcher> {
        PatternMatcher::ngram_preset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_resources_parse() {
        let model = FrenchModel::new();
        assert_eq!(model.name(), "fr");
        assert_eq!(model.month_names().len(), 12);
        assert_eq!(model.weekday_names().len(), 7);
        assert!(model.special_words().contains("aujourd'hui"));
        assert!(model.average_word_length() > 0);
    }

    #[test]
    fn semantic_preset_is_a_superset_of_ngram_preset() {
        let model = FrenchModel::new();
        assert!(model.semantic_matchers().len() > model.ngram_matchers().len());
    }

    #[test]
    fn stop_words_are_lowercased() {
        let mut model = FrenchModel::new();
        model.set_stop_words(vec!["Le".to_string(), "DE".to_string()]);
        assert!(model.stop_words().contains("le"));
        assert!(model.stop_words().contains("de"));
    }
}

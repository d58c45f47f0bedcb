//! The base-word reference dictionary.
//!
//! A JSON file of known word forms with per-form frequencies, consulted by
//! the case policy when deciding whether a corpus surface should adopt the
//! reference casing and whether a rare surface is a real word.
//!
//! ```json
//! [
//!   { "word": "chien", "frequency": 2.1e-4 },
//!   { "word": "Paris", "frequency": 8.0e-5 }
//! ]
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use predictext_base::{PredictError, Result};

#[derive(Deserialize)]
struct BaseWordEntry {
    word: String,
    frequency: f64,
}

/// Reference lexicon with frequency lookup by exact form and by lowercase
/// group.
pub struct BaseWordDictionary {
    by_form: FxHashMap<String, f64>,
    by_lower: FxHashMap<String, Vec<(String, f64)>>,
}

impl BaseWordDictionary {
    /// Loads the JSON reference file.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let entries: Vec<BaseWordEntry> = serde_json::from_reader(reader)
            .map_err(|e| PredictError::Decode(format!("base word dictionary: {}", e)))?;
        Ok(Self::from_entries(
            entries.into_iter().map(|e| (e.word, e.frequency)),
        ))
    }

    /// Builds a dictionary from `(form, frequency)` pairs.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        let mut by_form = FxHashMap::default();
        let mut by_lower: FxHashMap<String, Vec<(String, f64)>> = FxHashMap::default();
        for (word, frequency) in entries {
            by_lower
                .entry(word.to_lowercase())
                .or_default()
                .push((word.clone(), frequency));
            by_form.insert(word, frequency);
        }
        BaseWordDictionary { by_form, by_lower }
    }

    pub fn len(&self) -> usize {
        self.by_form.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_form.is_empty()
    }

    pub fn contains(&self, form: &str) -> bool {
        self.by_form.contains_key(form)
    }

    pub fn frequency(&self, form: &str) -> Option<f64> {
        self.by_form.get(form).copied()
    }

    /// The most frequent reference form sharing this lowercase shape.
    pub fn best_variant(&self, lower: &str) -> Option<(&str, f64)> {
        self.by_lower
            .get(lower)?
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(form, freq)| (form.as_str(), *freq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> BaseWordDictionary {
        BaseWordDictionary::from_entries(vec![
            ("chien".to_string(), 2e-4),
            ("Paris".to_string(), 8e-5),
            ("paris".to_string(), 1e-9),
        ])
    }

    #[test]
    fn exact_lookup() {
        let d = dict();
        assert!(d.contains("Paris"));
        assert!(!d.contains("PARIS"));
        assert_eq!(d.frequency("chien"), Some(2e-4));
    }

    #[test]
    fn best_variant_picks_the_most_frequent_casing() {
        let d = dict();
        let (form, freq) = d.best_variant("paris").unwrap();
        assert_eq!(form, "Paris");
        assert_eq!(freq, 8e-5);
    }

    #[test]
    fn unknown_lowercase_group_has_no_variant() {
        assert!(dict().best_variant("train").is_none());
    }
}

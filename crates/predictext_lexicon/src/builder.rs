//! Corpus case policy: from counted surfaces to the final vocabulary.
//!
//! Decisions per surface form, in order:
//!
//! 1. **Upper-case replacement** — when enough occurrences of an
//!    upper-cased form also appear in the lower form, the lower form
//!    replaces it everywhere (sentence-initial capitals collapse onto the
//!    common word).
//! 2. **Reference casing** — when the base-word dictionary knows a
//!    differently-cased variant above a frequency floor, that casing is
//!    adopted (`paris` → `Paris`).
//! 3. **Validity** — a resolved surface is kept when its count reaches the
//!    directly-valid threshold, or when the base dictionary knows it;
//!    surfaces at or below the unknown threshold, and rare surfaces the
//!    reference has never seen, map to UNKNOWN.
//!
//! Accepted surfaces receive ids in descending count order (ties broken
//! lexicographically), so two builds over the same corpus produce identical
//! `(surface, id)` pairs.

use rustc_hash::FxHashMap;

use predictext_base::Token;

use crate::base_words::BaseWordDictionary;
use crate::dictionary::WordDictionary;

/// Thresholds of the case policy, from the training configuration.
#[derive(Debug, Clone)]
pub struct CasePolicy {
    pub upper_case_replacement_threshold: f64,
    pub convert_case_from_dictionary_threshold: f64,
    pub unknown_word_count_threshold: u64,
    pub directly_valid_word_count_threshold: u64,
}

impl Default for CasePolicy {
    fn default() -> Self {
        CasePolicy {
            upper_case_replacement_threshold: 0.35,
            convert_case_from_dictionary_threshold: 1e-8,
            unknown_word_count_threshold: 0,
            directly_valid_word_count_threshold: 20,
        }
    }
}

/// Accumulates case-sensitive surface counts, then applies the policy.
#[derive(Default)]
pub struct WordDictionaryBuilder {
    counts: FxHashMap<String, u64>,
}

impl WordDictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one occurrence of a surface form.
    pub fn count_surface(&mut self, text: &str) {
        *self.counts.entry(text.to_string()).or_insert(0) += 1;
    }

    /// Counts the surface of a word token; other tokens are ignored
    /// (equivalence classes have reserved ids, separators none).
    pub fn count_token(&mut self, token: &Token) {
        if let Token::Word(text) = token {
            self.count_surface(text);
        }
    }

    /// Merges counts gathered by another builder (parallel fan-out).
    pub fn merge(&mut self, other: WordDictionaryBuilder) {
        for (text, count) in other.counts {
            *self.counts.entry(text).or_insert(0) += count;
        }
    }

    pub fn surface_count(&self, text: &str) -> u64 {
        self.counts.get(text).copied().unwrap_or(0)
    }

    /// Applies the policy. Returns the dictionary and the resolution map
    /// from each counted surface to its final surface (`None` = UNKNOWN),
    /// used to re-emit clean token streams.
    pub fn build(
        self,
        policy: &CasePolicy,
        base: Option<&BaseWordDictionary>,
    ) -> (WordDictionary, FxHashMap<String, Option<String>>) {
        // Case resolution per original surface.
        let mut resolved_form: FxHashMap<&str, String> = FxHashMap::default();
        for surface in self.counts.keys() {
            let mut form = surface.clone();

            let lower = form.to_lowercase();
            if lower != form {
                let lower_count = self.counts.get(&lower).copied().unwrap_or(0);
                let total = lower_count + self.counts[surface];
                if total > 0
                    && (lower_count as f64 / total as f64)
                        > policy.upper_case_replacement_threshold
                {
                    form = lower;
                }
            }

            if let Some(base) = base {
                if let Some((variant, freq)) = base.best_variant(&form.to_lowercase()) {
                    if variant != form && freq > policy.convert_case_from_dictionary_threshold {
                        form = variant.to_string();
                    }
                }
            }

            resolved_form.insert(surface.as_str(), form);
        }

        // Aggregate counts under the resolved forms.
        let mut final_counts: FxHashMap<&str, u64> = FxHashMap::default();
        for (surface, count) in &self.counts {
            let form = resolved_form[surface.as_str()].as_str();
            *final_counts.entry(form).or_insert(0) += count;
        }

        // Validity per resolved form.
        let accepted = |form: &str, count: u64| {
            if count <= policy.unknown_word_count_threshold {
                return false;
            }
            count >= policy.directly_valid_word_count_threshold
                || base.map(|b| b.contains(form)).unwrap_or(false)
        };

        let mut kept: Vec<(&str, u64)> = final_counts
            .iter()
            .filter(|(form, &count)| accepted(form, count))
            .map(|(form, &count)| (*form, count))
            .collect();
        // Descending count, then lexicographic: deterministic ids.
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut dictionary = WordDictionary::new();
        for (form, _) in &kept {
            dictionary.add_system_word(form);
        }

        let resolution = self
            .counts
            .keys()
            .map(|surface| {
                let form = &resolved_form[surface.as_str()];
                let target = dictionary
                    .get_word(form)
                    .map(|_| form.clone());
                (surface.clone(), target)
            })
            .collect();

        (dictionary, resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_from(counts: &[(&str, u64)]) -> WordDictionaryBuilder {
        let mut b = WordDictionaryBuilder::new();
        for (text, count) in counts {
            for _ in 0..*count {
                b.count_surface(text);
            }
        }
        b
    }

    fn permissive() -> CasePolicy {
        CasePolicy {
            directly_valid_word_count_threshold: 1,
            ..CasePolicy::default()
        }
    }

    #[test]
    fn frequent_surfaces_are_directly_valid() {
        let (dict, resolution) =
            builder_from(&[("chien", 25)]).build(&CasePolicy::default(), None);
        assert!(dict.get_word("chien").is_some());
        assert_eq!(resolution["chien"], Some("chien".to_string()));
    }

    #[test]
    fn rare_surfaces_without_reference_become_unknown() {
        let (dict, resolution) =
            builder_from(&[("zorglub", 3)]).build(&CasePolicy::default(), None);
        assert!(dict.get_word("zorglub").is_none());
        assert_eq!(resolution["zorglub"], None);
    }

    #[test]
    fn rare_surfaces_known_to_the_reference_are_kept() {
        let base = BaseWordDictionary::from_entries(vec![("zorglub".to_string(), 1e-6)]);
        let (dict, _) = builder_from(&[("zorglub", 3)]).build(&CasePolicy::default(), Some(&base));
        assert!(dict.get_word("zorglub").is_some());
    }

    #[test]
    fn capitalized_form_collapses_onto_the_common_lower_form() {
        // "Le" 10 times, "le" 30 times: 0.75 > 0.35, replace.
        let (dict, resolution) =
            builder_from(&[("Le", 10), ("le", 30)]).build(&permissive(), None);
        assert_eq!(resolution["Le"], Some("le".to_string()));
        assert!(dict.get_word("Le").is_none());
        assert!(dict.get_word("le").is_some());
    }

    #[test]
    fn dominant_capitalized_form_survives() {
        // "Paris" 30 times, "paris" 2 times: 2/32 < 0.35.
        let (dict, resolution) =
            builder_from(&[("Paris", 30), ("paris", 2)]).build(&permissive(), None);
        assert_eq!(resolution["Paris"], Some("Paris".to_string()));
        assert!(dict.get_word("Paris").is_some());
    }

    #[test]
    fn reference_casing_is_adopted() {
        let base = BaseWordDictionary::from_entries(vec![("Paris".to_string(), 8e-5)]);
        let (dict, resolution) =
            builder_from(&[("paris", 5)]).build(&permissive(), Some(&base));
        assert_eq!(resolution["paris"], Some("Paris".to_string()));
        assert!(dict.get_word("Paris").is_some());
        assert!(dict.get_word("paris").is_none());
    }

    #[test]
    fn unknown_threshold_discards_singletons() {
        let policy = CasePolicy {
            unknown_word_count_threshold: 1,
            directly_valid_word_count_threshold: 2,
            ..CasePolicy::default()
        };
        let (dict, _) = builder_from(&[("rare", 1), ("commun", 2)]).build(&policy, None);
        assert!(dict.get_word("rare").is_none());
        assert!(dict.get_word("commun").is_some());
    }

    #[test]
    fn ids_are_deterministic_across_builds() {
        let build = || {
            let (dict, _) = builder_from(&[("le", 30), ("chien", 20), ("mange", 20)])
                .build(&permissive(), None);
            let mut pairs: Vec<(String, i32)> = dict
                .all_words()
                .filter_map(|w| w.text().map(|t| (t.to_string(), w.id())))
                .collect();
            pairs.sort();
            pairs
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn higher_counts_get_lower_ids() {
        let (dict, _) =
            builder_from(&[("rare", 2), ("commun", 50)]).build(&permissive(), None);
        assert!(dict.get_word("commun").unwrap().id() < dict.get_word("rare").unwrap().id());
    }
}

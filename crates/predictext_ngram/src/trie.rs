//! The shared n-gram dictionary contract.
//!
//! Both trie shapes expose the same read operations and the same
//! interpolated probability model; mutation is part of the contract too,
//! but only the dynamic shape honors it — the static shape reports an
//! unsupported mutation, which is a programming error on the caller's side.

use predictext_base::{PredictError, Result, WordId};

/// A rooted n-gram trie: paths of length `k` from the root are k-grams.
pub trait NGramDictionary {
    /// Largest n-gram length persisted.
    fn max_order(&self) -> usize;

    /// True when the node reached by `prefix` exists.
    fn contains_prefix(&self, prefix: &[WordId]) -> bool {
        self.backoff_weight(prefix).is_some()
    }

    /// Smoothed frequency of `word` as a child of the `prefix` node, when
    /// both exist.
    fn child_frequency(&self, prefix: &[WordId], word: WordId) -> Option<f64>;

    /// Back-off weight of the `prefix` node, `None` when the node is
    /// absent. A childless node carries weight 1 (all mass backs off).
    fn backoff_weight(&self, prefix: &[WordId]) -> Option<f64>;

    /// Number of unigram children under the root.
    fn unigram_count(&self) -> usize;

    /// Children of the `prefix` node as `(word id, smoothed frequency)`
    /// pairs in ascending word-id order. Empty when the node is absent or
    /// childless.
    fn next_words(&self, prefix: &[WordId]) -> Vec<(WordId, f64)>;

    /// True when the `prefix` node exists and has at least one child,
    /// loading children from storage if needed.
    fn has_children(&self, prefix: &[WordId]) -> bool;

    /// Walks or creates the path `ngram` and adds `increment` to the
    /// terminal node's count. Read-only shapes refuse.
    fn put_and_increment_by(&mut self, ngram: &[WordId], increment: u64) -> Result<()>;

    /// Recomputes every node's frequency and back-off weight by absolute
    /// discounting with the per-order discounts `d` (`d[k-1]` applies to
    /// k-grams). Read-only shapes refuse.
    fn update_probabilities(&mut self, discounts: &[f64]) -> Result<()>;

    /// Interpolated back-off probability of `word` after `prefix`.
    ///
    /// At each level the smoothed frequency is combined with the back-off
    /// weight applied to the shorter-context probability; at the root the
    /// residual mass is spread uniformly over the unigrams, so the
    /// distribution over the vocabulary sums to one for any prefix.
    fn get_probability(&self, prefix: &[WordId], word: WordId) -> f64 {
        let context = self.max_order().saturating_sub(1);
        let start = prefix.len().saturating_sub(context);
        interpolate(self, &prefix[start..], word)
    }

    /// The smoothed frequency alone, erroring when the prefix node is
    /// missing.
    fn get_raw_probability(&self, prefix: &[WordId], word: WordId) -> Result<f64> {
        if !self.contains_prefix(prefix) {
            return Err(PredictError::InvalidArgument(format!(
                "no node for prefix {:?}",
                prefix
            )));
        }
        Ok(self.child_frequency(prefix, word).unwrap_or(0.0))
    }
}

fn interpolate<D: NGramDictionary + ?Sized>(dict: &D, prefix: &[WordId], word: WordId) -> f64 {
    if prefix.is_empty() {
        let frequency = dict.child_frequency(&[], word).unwrap_or(0.0);
        let backoff = dict.backoff_weight(&[]).unwrap_or(0.0);
        let unigrams = dict.unigram_count();
        return if unigrams > 0 {
            frequency + backoff / unigrams as f64
        } else {
            frequency
        };
    }
    match dict.backoff_weight(prefix) {
        // Unseen context: back off without penalty.
        None => interpolate(dict, &prefix[1..], word),
        Some(backoff) => {
            let frequency = dict.child_frequency(prefix, word).unwrap_or(0.0);
            frequency + backoff * interpolate(dict, &prefix[1..], word)
        }
    }
}

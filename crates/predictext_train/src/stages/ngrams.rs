//! Stage 4: n-gram counting and the static dictionary.
//!
//! Documents are split into sentences at sentence separators; separators
//! inside a sentence are dropped. Every sentence is prefixed with the START
//! tag and, for each position and each order up to the configured maximum,
//! the ending k-gram is counted — unless any component resolved to
//! UNKNOWN, in which case that candidate is discarded.
//!
//! Counting is the only stage with shared mutable state: a sharded
//! concurrent map whose single operation is increment-or-insert. After the
//! fan-out the counts feed a fresh dynamic trie, which is compacted,
//! discounted, optionally pruned, smoothed and serialized in the static
//! layout.

use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::BufReader;
use std::path::Path;
use std::sync::Mutex;

use rustc_hash::{FxHashMap, FxHasher};

use predictext_base::{Result, TagId, TokenReader, WordId};
use predictext_lexicon::WordDictionary;
use predictext_ngram::{
    prune_dictionary, DynamicNGramDictionary, NGramDictionary, PruningMethod, SmoothingConfig,
};

const SHARDS: usize = 64;

/// Sharded `n-gram → count` accumulator; increment-only while the
/// fan-out runs, drained afterwards.
pub struct NGramCounter {
    shards: Vec<Mutex<FxHashMap<Box<[WordId]>, u64>>>,
}

impl NGramCounter {
    pub fn new() -> Self {
        NGramCounter {
            shards: (0..SHARDS).map(|_| Mutex::new(FxHashMap::default())).collect(),
        }
    }

    pub fn increment(&self, ngram: &[WordId]) {
        let mut hasher = FxHasher::default();
        ngram.hash(&mut hasher);
        let shard = (hasher.finish() as usize) % SHARDS;
        let mut map = self.shards[shard].lock().expect("counter shard poisoned");
        match map.get_mut(ngram) {
            Some(count) => *count += 1,
            None => {
                map.insert(ngram.to_vec().into_boxed_slice(), 1);
            }
        }
    }

    pub fn total_distinct(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().expect("counter shard poisoned").len())
            .sum()
    }

    /// Drains every shard; order across shards is fixed, order inside a
    /// shard is map order (counts are commutative, so it does not matter).
    pub fn drain(self) -> Vec<(Box<[WordId]>, u64)> {
        self.shards
            .into_iter()
            .flat_map(|shard| shard.into_inner().expect("counter shard poisoned"))
            .collect()
    }
}

impl Default for NGramCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads one clean artifact and counts its n-grams of every order.
pub fn count_document(
    clean: &Path,
    dictionary: &WordDictionary,
    max_order: usize,
    counter: &NGramCounter,
) -> Result<()> {
    let mut reader = TokenReader::new(BufReader::new(File::open(clean)?));
    let start = TagId::Start.word_id();
    let unknown = TagId::Unknown.word_id();

    let mut sentence: Vec<WordId> = vec![start];
    loop {
        let token = reader.read_token()?;
        let sentence_ends = match &token {
            Some(t) => t.is_sentence_separator(),
            None => true,
        };
        if let Some(t) = &token {
            if !sentence_ends && !t.is_separator() {
                if let Some(id) = dictionary.word_id_for_token(t) {
                    sentence.push(id);
                }
            }
        }
        if sentence_ends {
            count_sentence(&sentence, unknown, max_order, counter);
            sentence.truncate(1);
        }
        if token.is_none() {
            break;
        }
    }
    Ok(())
}

/// Emits every k-gram ending at every position of one START-prefixed
/// sentence.
fn count_sentence(sentence: &[WordId], unknown: WordId, max_order: usize, counter: &NGramCounter) {
    if sentence.len() <= 1 {
        // Only the START tag: nothing was said.
        return;
    }
    for end in 0..sentence.len() {
        for order in 1..=max_order.min(end + 1) {
            let window = &sentence[end + 1 - order..=end];
            if window.contains(&unknown) {
                continue;
            }
            counter.increment(window);
        }
    }
}

/// Builds, prunes, smooths and serializes the static dictionary from the
/// drained counts.
pub fn build_and_save(
    counts: Vec<(Box<[WordId]>, u64)>,
    max_order: usize,
    smoothing: &SmoothingConfig,
    pruning: &PruningMethod,
    output: &Path,
) -> Result<DynamicNGramDictionary> {
    let mut dictionary = DynamicNGramDictionary::new(max_order)?;
    for (ngram, count) in counts {
        dictionary.put_and_increment_by(&ngram, count)?;
    }
    dictionary.compact();
    let discounts = dictionary.compute_discounts(smoothing);
    log::debug!("per-order discounts: {:?}", discounts);
    prune_dictionary(&mut dictionary, pruning, &discounts)?;
    dictionary.update_probabilities(&discounts)?;
    dictionary.save_static(output)?;
    Ok(dictionary)
}

//! The file-backed, read-only trie shape.
//!
//! The baseline model file is memory-mapped; opening it decodes only the
//! header, the root record and the unigram block. Deeper lookups binary
//! search child blocks directly in the mapped bytes, so a probability
//! query touches a handful of records and the map can be shared across
//! threads without locking.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use predictext_base::{PredictError, Result, WordId};

use crate::format::{self, NodeRecord, RootRecord, TrieFlavor, HEADER_LEN, NO_BLOCK};
use crate::trie::NGramDictionary;

const FLAVOR: TrieFlavor = TrieFlavor::Static;

/// The read-only baseline n-gram dictionary.
pub struct StaticNGramDictionary {
    map: Mmap,
    max_order: usize,
    root: RootRecord,
    /// Eagerly decoded root children.
    unigrams: Vec<NodeRecord>,
}

impl StaticNGramDictionary {
    /// Maps a static-layout file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // Safety: the mapping is read-only and the file is not expected to
        // be truncated while the dictionary is open.
        let map = unsafe { Mmap::map(&file)? };
        if map.len() < HEADER_LEN + FLAVOR.root_len() {
            return Err(PredictError::Decode("n-gram file too short".into()));
        }
        let max_order = format::decode_header(&map)?;
        let root = format::decode_root(&map, FLAVOR)?;
        let unigrams = decode_block(&map, root.block_position, root.children_count)?;
        Ok(StaticNGramDictionary {
            map,
            max_order,
            root,
            unigrams,
        })
    }

    /// Verifies that the decoded word ids fit the word dictionary this
    /// model is being opened against.
    pub fn check_word_dictionary(&self, id_bound: WordId) -> Result<()> {
        match self
            .unigrams
            .iter()
            .find(|r| r.word_id < 0 || r.word_id >= id_bound)
        {
            Some(record) => Err(PredictError::DictionaryMismatch(format!(
                "word id {} out of range 0..{}",
                record.word_id, id_bound
            ))),
            None => Ok(()),
        }
    }

    /// The block reference of the node at `prefix`, walking lazily through
    /// the mapped file.
    fn block_of(&self, prefix: &[WordId]) -> Option<(i64, i32)> {
        let mut position = self.root.block_position;
        let mut count = self.root.children_count;
        for &word in prefix {
            let record = self.find_in_block(position, count, word)?;
            position = record.block_position;
            count = record.children_count;
        }
        Some((position, count))
    }

    /// The record of the node at `prefix`; `None` for the root itself.
    fn record_of(&self, prefix: &[WordId]) -> Option<NodeRecord> {
        let (&last, context) = prefix.split_last()?;
        let (position, count) = self.block_of(context)?;
        self.find_in_block(position, count, last)
    }

    /// Binary search over the sorted records of one child block.
    fn find_in_block(&self, position: i64, count: i32, word: WordId) -> Option<NodeRecord> {
        if position == NO_BLOCK || count <= 0 {
            return None;
        }
        let base = position as usize;
        let (mut lo, mut hi) = (0usize, count as usize);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let candidate = format::record_word_id(&self.map, base, mid, FLAVOR).ok()?;
            match candidate.cmp(&word) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => {
                    return format::decode_record(&self.map, base + mid * FLAVOR.record_len(), FLAVOR)
                        .ok()
                }
            }
        }
        None
    }
}

impl NGramDictionary for StaticNGramDictionary {
    fn max_order(&self) -> usize {
        self.max_order
    }

    fn child_frequency(&self, prefix: &[WordId], word: WordId) -> Option<f64> {
        if prefix.is_empty() {
            return self
                .unigrams
                .binary_search_by_key(&word, |r| r.word_id)
                .ok()
                .map(|i| self.unigrams[i].frequency as f64);
        }
        let (position, count) = self.block_of(prefix)?;
        self.find_in_block(position, count, word)
            .map(|r| r.frequency as f64)
    }

    fn backoff_weight(&self, prefix: &[WordId]) -> Option<f64> {
        if prefix.is_empty() {
            return Some(self.root.backoff_weight as f64);
        }
        self.record_of(prefix).map(|r| r.backoff_weight as f64)
    }

    fn unigram_count(&self) -> usize {
        self.unigrams.len()
    }

    fn next_words(&self, prefix: &[WordId]) -> Vec<(WordId, f64)> {
        if prefix.is_empty() {
            return self
                .unigrams
                .iter()
                .map(|r| (r.word_id, r.frequency as f64))
                .collect();
        }
        match self
            .block_of(prefix)
            .and_then(|(position, count)| decode_block(&self.map, position, count).ok())
        {
            Some(records) => records
                .into_iter()
                .map(|r| (r.word_id, r.frequency as f64))
                .collect(),
            None => Vec::new(),
        }
    }

    fn has_children(&self, prefix: &[WordId]) -> bool {
        self.block_of(prefix)
            .map(|(position, count)| position != NO_BLOCK && count > 0)
            .unwrap_or(false)
    }

    fn put_and_increment_by(&mut self, _ngram: &[WordId], _increment: u64) -> Result<()> {
        Err(PredictError::UnsupportedMutation("put_and_increment_by"))
    }

    fn update_probabilities(&mut self, _discounts: &[f64]) -> Result<()> {
        Err(PredictError::UnsupportedMutation("update_probabilities"))
    }
}

/// Decodes one whole child block; a single read covers all records.
fn decode_block(bytes: &[u8], position: i64, count: i32) -> Result<Vec<NodeRecord>> {
    if position == NO_BLOCK || count <= 0 {
        return Ok(Vec::new());
    }
    if position < 0 {
        return Err(PredictError::Decode(format!(
            "corrupt child block position {}",
            position
        )));
    }
    let base = position as usize;
    (0..count as usize)
        .map(|i| format::decode_record(bytes, base + i * FLAVOR.record_len(), FLAVOR))
        .collect()
}

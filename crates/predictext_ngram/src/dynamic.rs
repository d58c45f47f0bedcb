//! The in-memory, mutable trie shape.
//!
//! Nodes are allocated from a `Vec` arena and addressed by `u32` handles;
//! each node's children map stores handles, not pointers, which keeps the
//! hot maps small and sidesteps ownership cycles. Training inserts counts
//! with [`DynamicNGramDictionary::put_and_increment_by`], then smoothing
//! turns counts into frequencies and back-off weights.
//!
//! Persistence uses the layout of [`format`](crate::format): the static
//! flavor for the shipped baseline model, the dynamic flavor (counts
//! included) for the per-user model.

use std::fs;
use std::path::Path;

use predictext_base::{PredictError, Result, WordId};

use crate::format::{
    self, NodeRecord, RootRecord, TrieFlavor, HEADER_LEN, NO_BLOCK,
};
use crate::map::TrieNodeMap;
use crate::smoothing::SmoothingConfig;
use crate::trie::NGramDictionary;
use crate::DEFAULT_DISCOUNT;

const ROOT: u32 = 0;

/// One trie node: training count, smoothed statistics, children handles.
struct DynamicNode {
    count: u64,
    frequency: f64,
    backoff_weight: f64,
    children: Option<TrieNodeMap<u32>>,
}

impl DynamicNode {
    fn new() -> Self {
        DynamicNode {
            count: 0,
            frequency: 0.0,
            // All mass backs off until smoothing assigns children weight.
            backoff_weight: 1.0,
            children: None,
        }
    }

    fn child(&self, word: WordId) -> Option<u32> {
        self.children.as_ref().and_then(|c| c.get(word).copied())
    }

    fn children_len(&self) -> usize {
        self.children.as_ref().map(|c| c.len()).unwrap_or(0)
    }
}

/// The mutable n-gram trie used for training and the per-user model.
pub struct DynamicNGramDictionary {
    nodes: Vec<DynamicNode>,
    max_order: usize,
}

impl DynamicNGramDictionary {
    /// An empty trie for n-grams up to `max_order`.
    pub fn new(max_order: usize) -> Result<Self> {
        if max_order < 1 {
            return Err(PredictError::InvalidArgument(format!(
                "max order must be at least 1, got {}",
                max_order
            )));
        }
        Ok(DynamicNGramDictionary {
            nodes: vec![DynamicNode::new()],
            max_order,
        })
    }

    /// Number of allocated nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Walks `prefix` from the root; `None` when any edge is missing.
    fn node_for_prefix(&self, prefix: &[WordId]) -> Option<u32> {
        let mut current = ROOT;
        for &word in prefix {
            current = self.nodes[current as usize].child(word)?;
        }
        Some(current)
    }

    /// Training count of the `ngram` node, if present.
    pub fn count_of(&self, ngram: &[WordId]) -> Option<u64> {
        self.node_for_prefix(ngram)
            .map(|h| self.nodes[h as usize].count)
    }

    /// Rebuilds every children map at its tightest prime capacity.
    pub fn compact(&mut self) {
        for node in &mut self.nodes {
            if let Some(children) = node.children.as_mut() {
                children.compact();
            }
        }
    }

    /// Estimates per-order discounts from the count-of-counts.
    pub fn compute_discounts(&self, config: &SmoothingConfig) -> Vec<f64> {
        let mut singletons = vec![0u64; self.max_order];
        let mut doubletons = vec![0u64; self.max_order];
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((handle, depth)) = stack.pop() {
            let node = &self.nodes[handle as usize];
            if depth > 0 {
                match node.count {
                    1 => singletons[depth - 1] += 1,
                    2 => doubletons[depth - 1] += 1,
                    _ => {}
                }
            }
            if depth < self.max_order {
                if let Some(children) = node.children.as_ref() {
                    children.for_each_entry(|_, &child| stack.push((child, depth + 1)));
                }
            }
        }
        (0..self.max_order)
            .map(|k| config.discount_for(singletons[k], doubletons[k]))
            .collect()
    }

    /// Re-smooths only the subtree under `prefix`.
    pub fn update_probabilities_under(
        &mut self,
        prefix: &[WordId],
        discounts: &[f64],
    ) -> Result<()> {
        let handle = self.node_for_prefix(prefix).ok_or_else(|| {
            PredictError::InvalidArgument(format!("no node for prefix {:?}", prefix))
        })?;
        self.smooth_subtree(handle, prefix.len(), discounts);
        Ok(())
    }

    /// Smooths the subtree rooted at `handle`, whose depth is `depth`.
    fn smooth_subtree(&mut self, handle: u32, depth: usize, discounts: &[f64]) {
        let mut stack = vec![(handle, depth)];
        while let Some((handle, depth)) = stack.pop() {
            let child_handles: Vec<u32> = match self.nodes[handle as usize].children.as_ref() {
                Some(children) => children.iter().map(|(_, &h)| h).collect(),
                None => continue,
            };
            if child_handles.is_empty() {
                continue;
            }
            let discount = discounts
                .get(depth)
                .copied()
                .unwrap_or(DEFAULT_DISCOUNT);
            let total: u64 = child_handles
                .iter()
                .map(|&h| self.nodes[h as usize].count)
                .sum();
            let mut frequency_sum = 0.0;
            for &child in &child_handles {
                let count = self.nodes[child as usize].count;
                let frequency = if total > 0 {
                    (count as f64 - discount).max(0.0) / total as f64
                } else {
                    0.0
                };
                self.nodes[child as usize].frequency = frequency;
                frequency_sum += frequency;
            }
            self.nodes[handle as usize].backoff_weight = (1.0 - frequency_sum).max(0.0);
            for &child in &child_handles {
                stack.push((child, depth + 1));
            }
        }
    }

    /// Removes the `word` edge (and its subtree) under the node at
    /// `parent`. Used by pruning; the orphaned nodes stay in the arena
    /// until the dictionary is dropped.
    pub(crate) fn remove_child(&mut self, parent: u32, word: WordId) -> bool {
        match self.nodes[parent as usize].children.as_mut() {
            Some(children) => children.remove(word).is_some(),
            None => false,
        }
    }

    pub(crate) fn child_entries(&self, handle: u32) -> Vec<(WordId, u32)> {
        match self.nodes[handle as usize].children.as_ref() {
            Some(children) => {
                let mut entries: Vec<(WordId, u32)> =
                    children.iter().map(|(k, &v)| (k, v)).collect();
                entries.sort_unstable_by_key(|&(k, _)| k);
                entries
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn node_stats(&self, handle: u32) -> (u64, f64, f64) {
        let node = &self.nodes[handle as usize];
        (node.count, node.frequency, node.backoff_weight)
    }

    pub(crate) fn root_handle(&self) -> u32 {
        ROOT
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Serializes in the static layout (no counts): the baseline model
    /// file the static reader opens.
    pub fn save_static(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes(TrieFlavor::Static)?)?;
        Ok(())
    }

    /// Serializes in the dynamic layout (counts included) so the model can
    /// be reopened for further training.
    pub fn save_dynamic(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes(TrieFlavor::Dynamic)?)?;
        Ok(())
    }

    /// Reopens a dynamic-layout file and recomputes probabilities with the
    /// default discount.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, None)
    }

    /// Reopens a dynamic-layout file, recomputing probabilities with the
    /// given per-order discounts.
    pub fn open_with_discounts(path: &Path, discounts: &[f64]) -> Result<Self> {
        Self::open_with(path, Some(discounts))
    }

    fn open_with(path: &Path, discounts: Option<&[f64]>) -> Result<Self> {
        let bytes = fs::read(path)?;
        if bytes.len() < HEADER_LEN + TrieFlavor::Dynamic.root_len() {
            return Err(PredictError::Decode("n-gram file too short".into()));
        }
        let max_order = format::decode_header(&bytes)?;
        let root = format::decode_root(&bytes, TrieFlavor::Dynamic)?;
        let mut dict = DynamicNGramDictionary::new(max_order)?;
        dict.nodes[ROOT as usize].count = root.count.max(0) as u64;
        dict.read_block(&bytes, root.block_position, root.children_count, ROOT)?;
        let discounts = match discounts {
            Some(d) => d.to_vec(),
            None => vec![DEFAULT_DISCOUNT; max_order],
        };
        dict.smooth_subtree(ROOT, 0, &discounts);
        Ok(dict)
    }

    fn read_block(
        &mut self,
        bytes: &[u8],
        position: i64,
        count: i32,
        parent: u32,
    ) -> Result<()> {
        if position == NO_BLOCK {
            return Ok(());
        }
        if position < 0 || count < 0 {
            return Err(PredictError::Decode(format!(
                "corrupt child block reference {}:{}",
                position, count
            )));
        }
        let record_len = TrieFlavor::Dynamic.record_len();
        for index in 0..count as usize {
            let offset = position as usize + index * record_len;
            let record = format::decode_record(bytes, offset, TrieFlavor::Dynamic)?;
            let handle = self.alloc();
            let node = &mut self.nodes[handle as usize];
            node.count = record.count.max(0) as u64;
            self.nodes[parent as usize]
                .children
                .get_or_insert_with(TrieNodeMap::new)
                .put(record.word_id, handle);
            self.read_block(bytes, record.block_position, record.children_count, handle)?;
        }
        Ok(())
    }

    fn to_bytes(&self, flavor: TrieFlavor) -> Result<Vec<u8>> {
        let order = self.write_order();

        // Pass 1: assign block positions in emission order.
        let mut positions: Vec<i64> = vec![NO_BLOCK; self.nodes.len()];
        let mut next = (HEADER_LEN + flavor.root_len()) as i64;
        for &handle in &order {
            let len = self.nodes[handle as usize].children_len();
            if len > 0 {
                positions[handle as usize] = next;
                next += (len * flavor.record_len()) as i64;
            }
        }

        // Pass 2: emit.
        let mut out = Vec::with_capacity(next as usize);
        format::encode_header(self.max_order, &mut out);
        let root = &self.nodes[ROOT as usize];
        format::encode_root(
            &RootRecord {
                block_position: positions[ROOT as usize],
                children_count: root.children_len() as i32,
                frequency: root.frequency as f32,
                backoff_weight: root.backoff_weight as f32,
                count: root.count.min(i32::MAX as u64) as i32,
            },
            flavor,
            &mut out,
        );
        for &handle in &order {
            for (word, child) in self.child_entries(handle) {
                let node = &self.nodes[child as usize];
                format::encode_record(
                    &NodeRecord {
                        word_id: word,
                        frequency: node.frequency as f32,
                        backoff_weight: node.backoff_weight as f32,
                        block_position: positions[child as usize],
                        children_count: node.children_len() as i32,
                        count: node.count.min(i32::MAX as u64) as i32,
                    },
                    flavor,
                    &mut out,
                );
            }
        }
        Ok(out)
    }

    /// Depth-first pre-order over nodes with children, children visited in
    /// ascending word-id order; shared by both serialization passes.
    fn write_order(&self) -> Vec<u32> {
        let mut order = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(handle) = stack.pop() {
            if self.nodes[handle as usize].children_len() == 0 {
                continue;
            }
            order.push(handle);
            let entries = self.child_entries(handle);
            for &(_, child) in entries.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    fn alloc(&mut self) -> u32 {
        let handle = self.nodes.len() as u32;
        self.nodes.push(DynamicNode::new());
        handle
    }
}

impl NGramDictionary for DynamicNGramDictionary {
    fn max_order(&self) -> usize {
        self.max_order
    }

    fn child_frequency(&self, prefix: &[WordId], word: WordId) -> Option<f64> {
        let node = self.node_for_prefix(prefix)?;
        let child = self.nodes[node as usize].child(word)?;
        Some(self.nodes[child as usize].frequency)
    }

    fn backoff_weight(&self, prefix: &[WordId]) -> Option<f64> {
        self.node_for_prefix(prefix)
            .map(|h| self.nodes[h as usize].backoff_weight)
    }

    fn unigram_count(&self) -> usize {
        self.nodes[ROOT as usize].children_len()
    }

    fn next_words(&self, prefix: &[WordId]) -> Vec<(WordId, f64)> {
        match self.node_for_prefix(prefix) {
            Some(handle) => self
                .child_entries(handle)
                .into_iter()
                .map(|(word, child)| (word, self.nodes[child as usize].frequency))
                .collect(),
            None => Vec::new(),
        }
    }

    fn has_children(&self, prefix: &[WordId]) -> bool {
        self.node_for_prefix(prefix)
            .map(|h| self.nodes[h as usize].children_len() > 0)
            .unwrap_or(false)
    }

    fn put_and_increment_by(&mut self, ngram: &[WordId], increment: u64) -> Result<()> {
        if ngram.is_empty() {
            return Err(PredictError::InvalidArgument("empty n-gram".into()));
        }
        if ngram.len() > self.max_order {
            return Err(PredictError::InvalidArgument(format!(
                "n-gram of order {} exceeds max order {}",
                ngram.len(),
                self.max_order
            )));
        }
        let mut current = ROOT;
        for &word in ngram {
            let existing = self.nodes[current as usize].child(word);
            current = match existing {
                Some(handle) => handle,
                None => {
                    let handle = self.alloc();
                    self.nodes[current as usize]
                        .children
                        .get_or_insert_with(TrieNodeMap::new)
                        .put(word, handle);
                    handle
                }
            };
        }
        self.nodes[current as usize].count += increment;
        Ok(())
    }

    fn update_probabilities(&mut self, discounts: &[f64]) -> Result<()> {
        self.smooth_subtree(ROOT, 0, discounts);
        Ok(())
    }
}

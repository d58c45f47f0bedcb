//! Pruning: shrinking the trained trie before probability computation.
//!
//! One method is selected per training run:
//!
//! - `None` keeps everything.
//! - `RawCount` drops any node whose count is at or below a threshold.
//! - `OrderCount` applies a per-order count floor (`-1` keeps the order
//!   untouched).
//! - The weighted-difference methods walk parents bottom-up and drop an
//!   edge when the probability mass it explains barely differs from what
//!   the back-off path would assign anyway; after each parent's decisions
//!   its local smoothing is re-run so later decisions see current weights.
//!
//! The pipeline re-runs global smoothing after pruning in every case.

use predictext_base::{Result, WordId};

use crate::dynamic::DynamicNGramDictionary;
use crate::trie::NGramDictionary;

/// The pruning method of one training run.
#[derive(Debug, Clone, PartialEq)]
pub enum PruningMethod {
    None,
    RawCount {
        threshold: u64,
    },
    /// Per-order minimum counts, order 1 first; `-1` keeps all.
    OrderCount {
        thresholds: Vec<i64>,
    },
    WeightedDifferenceRawProb {
        threshold: f64,
    },
    WeightedDifferenceFullProb {
        threshold: f64,
    },
}

/// Applies `method` to the trie. The weighted-difference methods need the
/// per-order discounts to re-smooth locally as they go.
pub fn prune(
    dict: &mut DynamicNGramDictionary,
    method: &PruningMethod,
    discounts: &[f64],
) -> Result<()> {
    match method {
        PruningMethod::None => Ok(()),
        PruningMethod::RawCount { threshold } => {
            prune_by_count(dict, |_, count| count <= *threshold);
            Ok(())
        }
        PruningMethod::OrderCount { thresholds } => {
            let thresholds = thresholds.clone();
            prune_by_count(dict, move |order, count| {
                match thresholds.get(order - 1).copied() {
                    Some(t) if t >= 0 => (count as i64) < t,
                    _ => false,
                }
            });
            Ok(())
        }
        PruningMethod::WeightedDifferenceRawProb { threshold } => {
            prune_weighted(dict, *threshold, false, discounts)
        }
        PruningMethod::WeightedDifferenceFullProb { threshold } => {
            prune_weighted(dict, *threshold, true, discounts)
        }
    }
}

/// Top-down removal of nodes failing a `(order, count)` predicate; removing
/// an edge drops its whole subtree.
fn prune_by_count(dict: &mut DynamicNGramDictionary, doomed: impl Fn(usize, u64) -> bool) {
    let mut stack = vec![(dict.root_handle(), 0usize)];
    while let Some((parent, depth)) = stack.pop() {
        for (word, child) in dict.child_entries(parent) {
            let (count, _, _) = dict.node_stats(child);
            if doomed(depth + 1, count) {
                dict.remove_child(parent, word);
            } else {
                stack.push((child, depth + 1));
            }
        }
    }
}

/// Bottom-up weighted-difference pruning over parents of order ≥ 2 edges.
fn prune_weighted(
    dict: &mut DynamicNGramDictionary,
    threshold: f64,
    full_probability: bool,
    discounts: &[f64],
) -> Result<()> {
    // Decisions read current frequencies and back-off weights.
    dict.update_probabilities(discounts)?;

    // Parents with their context prefixes, deepest first.
    let mut parents: Vec<(u32, Vec<WordId>)> = Vec::new();
    let mut stack = vec![(dict.root_handle(), Vec::new())];
    while let Some((handle, prefix)) = stack.pop() {
        for (word, child) in dict.child_entries(handle) {
            let mut child_prefix = prefix.clone();
            child_prefix.push(word);
            stack.push((child, child_prefix));
        }
        if !prefix.is_empty() {
            parents.push((handle, prefix));
        }
    }
    parents.sort_by_key(|(_, prefix)| std::cmp::Reverse(prefix.len()));

    for (parent, prefix) in parents {
        let mut removed_any = false;
        for (word, child) in dict.child_entries(parent) {
            let (_, frequency, _) = dict.node_stats(child);
            let (_, _, parent_backoff) = dict.node_stats(parent);

            let kept = if full_probability {
                dict.get_probability(&prefix, word)
            } else {
                frequency
            };
            let fallback = parent_backoff
                * if full_probability {
                    dict.get_probability(&prefix[1..], word)
                } else {
                    dict.child_frequency(&prefix[1..], word).unwrap_or(0.0)
                };

            let divergence = if kept <= 0.0 {
                0.0
            } else if fallback <= 0.0 {
                f64::INFINITY
            } else {
                frequency * (kept.ln() - fallback.ln()).abs()
            };
            if divergence < threshold {
                dict.remove_child(parent, word);
                removed_any = true;
            }
        }
        if removed_any {
            dict.update_probabilities_under(&prefix, discounts)?;
        }
    }
    Ok(())
}

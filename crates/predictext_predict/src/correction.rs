//! Spelling-correction rules.
//!
//! Rules form a tree: leaves carry substitution rules with costs, branches
//! group them (per keyboard layout, per error family). The generator
//! applies substitutions to a detected prefix, breadth-first, accumulating
//! costs; alternatives above the cost ceiling are discarded and duplicates
//! keep their cheapest derivation.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

/// One substitution: every occurrence of `pattern` may be rewritten to
/// `replacement` at the given cost.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionRule {
    pub pattern: String,
    pub replacement: String,
    pub cost: f64,
}

impl CorrectionRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>, cost: f64) -> Self {
        CorrectionRule {
            pattern: pattern.into(),
            replacement: replacement.into(),
            cost,
        }
    }
}

/// A tree of correction rules.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionRuleNode {
    Leaf(Vec<CorrectionRule>),
    Branch(Vec<CorrectionRuleNode>),
}

/// Upper bound on explored rewrite states per prefix.
const MAX_STATES: usize = 512;

impl CorrectionRuleNode {
    /// Every rule in the tree, depth-first.
    pub fn rules(&self) -> Vec<&CorrectionRule> {
        let mut rules = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                CorrectionRuleNode::Leaf(leaf) => rules.extend(leaf.iter()),
                CorrectionRuleNode::Branch(children) => stack.extend(children.iter()),
            }
        }
        rules
    }

    /// The French accent-recovery preset: unaccented letters may stand for
    /// their accented variants at low cost.
    pub fn accents() -> Self {
        let rules = [
            ("e", "é", 0.2),
            ("e", "è", 0.2),
            ("e", "ê", 0.25),
            ("e", "ë", 0.3),
            ("a", "à", 0.2),
            ("a", "â", 0.25),
            ("u", "ù", 0.2),
            ("u", "û", 0.25),
            ("i", "î", 0.25),
            ("i", "ï", 0.3),
            ("o", "ô", 0.25),
            ("c", "ç", 0.2),
        ];
        CorrectionRuleNode::Leaf(
            rules
                .into_iter()
                .map(|(p, r, c)| CorrectionRule::new(p, r, c))
                .collect(),
        )
    }

    /// Alternative prefixes reachable from `prefix` within `max_cost`,
    /// cheapest first. The unmodified prefix is not included.
    pub fn alternative_prefixes(&self, prefix: &str, max_cost: f64) -> Vec<(String, f64)> {
        let rules = self.rules();
        let mut best: FxHashMap<String, f64> = FxHashMap::default();
        let mut queue: VecDeque<(String, f64)> = VecDeque::new();
        queue.push_back((prefix.to_string(), 0.0));
        let mut explored = 0;

        while let Some((current, cost)) = queue.pop_front() {
            if explored >= MAX_STATES {
                break;
            }
            explored += 1;
            for rule in &rules {
                let mut search_from = 0;
                while let Some(found) = current[search_from..].find(&rule.pattern) {
                    let at = search_from + found;
                    let next_cost = cost + rule.cost;
                    if next_cost <= max_cost {
                        let mut rewritten = String::with_capacity(current.len());
                        rewritten.push_str(&current[..at]);
                        rewritten.push_str(&rule.replacement);
                        rewritten.push_str(&current[at + rule.pattern.len()..]);
                        let seen = best.get(&rewritten).copied();
                        if seen.map(|c| next_cost < c).unwrap_or(true) {
                            best.insert(rewritten.clone(), next_cost);
                            queue.push_back((rewritten, next_cost));
                        }
                    }
                    search_from = at + rule.pattern.len().max(1);
                }
            }
        }

        best.remove(prefix);
        let mut alternatives: Vec<(String, f64)> = best.into_iter().collect();
        alternatives.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        alternatives
    }
}

//! Staged corpus training pipeline.
//!
//! Turns a directory of text documents into the two model files the
//! predictor loads: a gzip word dictionary and a static n-gram dictionary.
//! Four ordered stages, each an embarrassingly parallel fan-out over
//! documents with a barrier in between:
//!
//! 1. **Parser** — tokenize every document to a raw token artifact
//! 2. **TokenConvert** — fold n-gram patterns (numbers, acronyms,
//!    elisions, hyphen compounds)
//! 3. **WordsDictionary** — count surfaces, apply the case policy, save
//!    the word dictionary, re-emit resolved token streams
//! 4. **NgramDictionary** — count n-grams of every order, build the
//!    dynamic trie, estimate discounts, prune, smooth, serialize in the
//!    static layout
//!
//! Stage artifacts live under a working directory, so a run can resume
//! from a later stage against cached artifacts (`initial_step`).
//! Per-document failures are logged and skipped; the run continues.

mod config;
mod pipeline;
mod stages;

pub use config::{PruningMethodName, TrainingConfiguration};
pub use pipeline::{Trainer, TrainingStep};

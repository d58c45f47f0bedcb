//! Stage orchestration.
//!
//! Each stage fans out over documents on the rayon pool and waits for the
//! whole batch before the next stage starts. Artifacts land under the
//! working directory, one subdirectory per stage, one file per document,
//! named by the document's index in the sorted corpus listing — which is
//! what makes `initial_step` resumption line up across runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use predictext_base::{PredictError, Result};
use predictext_language::FrenchModel;
use predictext_lexicon::{BaseWordDictionary, WordDictionary, WordDictionaryBuilder};

use crate::config::TrainingConfiguration;
use crate::stages::{convert, ngrams, parse, words};

/// The ordered pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrainingStep {
    Parser,
    TokenConvert,
    WordsDictionary,
    NgramDictionary,
    /// Listed for completeness; selecting it is rejected.
    SemanticDictionary,
}

impl FromStr for TrainingStep {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "parser" => Ok(TrainingStep::Parser),
            "token_convert" => Ok(TrainingStep::TokenConvert),
            "words_dictionary" => Ok(TrainingStep::WordsDictionary),
            "ngram_dictionary" => Ok(TrainingStep::NgramDictionary),
            "semantic_dictionary" => Ok(TrainingStep::SemanticDictionary),
            other => Err(PredictError::InvalidArgument(format!(
                "unknown training step '{}'",
                other
            ))),
        }
    }
}

/// Drives the four stages over one corpus.
pub struct Trainer {
    config: TrainingConfiguration,
    model: FrenchModel,
    base_words: Option<BaseWordDictionary>,
    working_dir: PathBuf,
}

impl Trainer {
    /// Prepares a trainer: loads the optional base-word and stop-word
    /// resources named by the configuration.
    pub fn new(config: TrainingConfiguration, working_dir: PathBuf) -> Result<Self> {
        config.validate()?;
        let mut model = FrenchModel::new();
        if let Some(path) = &config.stop_word_dictionary_path {
            let text = fs::read_to_string(path)?;
            model.set_stop_words(
                text.lines()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty()),
            );
        }
        let base_words = match &config.base_word_dictionary_path {
            Some(path) => Some(BaseWordDictionary::load(path)?),
            None => None,
        };
        Ok(Trainer {
            config,
            model,
            base_words,
            working_dir,
        })
    }

    /// Runs the pipeline from `initial_step` onward, producing the word
    /// dictionary and static n-gram dictionary files.
    pub fn run(
        &self,
        corpus_dir: &Path,
        word_dictionary_path: &Path,
        ngram_dictionary_path: &Path,
        initial_step: TrainingStep,
    ) -> Result<()> {
        if initial_step == TrainingStep::SemanticDictionary {
            return Err(PredictError::InvalidArgument(
                "the semantic dictionary stage is not part of this pipeline".into(),
            ));
        }
        let documents = list_documents(corpus_dir)?;
        if documents.is_empty() {
            return Err(PredictError::InvalidArgument(format!(
                "no documents under {}",
                corpus_dir.display()
            )));
        }
        log::info!(
            "training on {} documents from {}",
            documents.len(),
            corpus_dir.display()
        );

        if initial_step <= TrainingStep::Parser {
            self.run_parser(&documents)?;
        }
        if initial_step <= TrainingStep::TokenConvert {
            self.run_convert(&documents)?;
        }
        let dictionary = if initial_step <= TrainingStep::WordsDictionary {
            self.run_words(&documents, word_dictionary_path)?
        } else {
            WordDictionary::load(word_dictionary_path)?
        };
        self.run_ngrams(&documents, &dictionary, ngram_dictionary_path)?;
        Ok(())
    }

    fn run_parser(&self, documents: &[PathBuf]) -> Result<()> {
        let dir = self.stage_dir("parser")?;
        let completed = self.fan_out("parser", documents, |index, document| {
            parse::run(document, &artifact(&dir, index), &self.model)
        });
        ensure_progress("parser", completed)
    }

    fn run_convert(&self, documents: &[PathBuf]) -> Result<()> {
        let raw_dir = self.stage_path("parser");
        let dir = self.stage_dir("converted")?;
        let completed = self.fan_out("token_convert", documents, |index, _| {
            convert::run(&artifact(&raw_dir, index), &artifact(&dir, index), &self.model)
        });
        ensure_progress("token_convert", completed)
    }

    fn run_words(&self, documents: &[PathBuf], output: &Path) -> Result<WordDictionary> {
        let converted_dir = self.stage_path("converted");
        let clean_dir = self.stage_dir("clean")?;
        let started = Instant::now();

        // Pass 1: merge per-document surface counts.
        let builder = documents
            .par_iter()
            .enumerate()
            .map(|(index, _)| match words::count(&artifact(&converted_dir, index)) {
                Ok(builder) => builder,
                Err(e) => {
                    log::warn!("words_dictionary: skipping document {}: {}", index, e);
                    WordDictionaryBuilder::new()
                }
            })
            .reduce(WordDictionaryBuilder::new, |mut a, b| {
                a.merge(b);
                a
            });

        let (dictionary, resolution) =
            words::build_dictionary(builder, &self.config.case_policy(), self.base_words.as_ref());
        dictionary.save(output)?;
        log::info!(
            "words_dictionary: {} entries in {:.1?}",
            dictionary.len(),
            started.elapsed()
        );

        // Pass 2: re-emit each document with resolved surfaces.
        let completed = self.fan_out("clean_tokens", documents, |index, _| {
            words::rewrite(
                &artifact(&converted_dir, index),
                &artifact(&clean_dir, index),
                &resolution,
            )
        });
        ensure_progress("clean_tokens", completed)?;
        Ok(dictionary)
    }

    fn run_ngrams(
        &self,
        documents: &[PathBuf],
        dictionary: &WordDictionary,
        output: &Path,
    ) -> Result<()> {
        let clean_dir = self.stage_path("clean");
        let counter = ngrams::NGramCounter::new();
        let completed = self.fan_out("ngram_count", documents, |index, _| {
            ngrams::count_document(
                &artifact(&clean_dir, index),
                dictionary,
                self.config.ngram_order,
                &counter,
            )
        });
        ensure_progress("ngram_count", completed)?;

        let started = Instant::now();
        let distinct = counter.total_distinct();
        let ngrams = ngrams::build_and_save(
            counter.drain(),
            self.config.ngram_order,
            &self.config.smoothing(),
            &self.config.pruning(),
            output,
        )?;
        log::info!(
            "ngram_dictionary: {} distinct n-grams, {} nodes kept, built in {:.1?}",
            distinct,
            ngrams.node_count(),
            started.elapsed()
        );
        Ok(())
    }

    /// Runs one per-document closure over the pool; failures are logged
    /// and skipped. Returns how many documents completed.
    fn fan_out<F>(&self, stage: &str, documents: &[PathBuf], task: F) -> usize
    where
        F: Fn(usize, &Path) -> Result<()> + Sync,
    {
        let started = Instant::now();
        let progress = AtomicUsize::new(0);
        let completed: usize = documents
            .par_iter()
            .enumerate()
            .map(|(index, document)| {
                let outcome = match task(index, document) {
                    Ok(()) => 1,
                    Err(e) => {
                        log::warn!(
                            "{}: skipping document {} ({}): {}",
                            stage,
                            index,
                            document.display(),
                            e
                        );
                        0
                    }
                };
                let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                log::debug!("{}: {}/{} documents", stage, done, documents.len());
                outcome
            })
            .sum();
        log::info!(
            "{}: {}/{} documents in {:.1?}",
            stage,
            completed,
            documents.len(),
            started.elapsed()
        );
        completed
    }

    fn stage_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.stage_path(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn stage_path(&self, name: &str) -> PathBuf {
        self.working_dir.join(name)
    }
}

fn artifact(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("doc_{:05}.tok", index))
}

/// Every regular file under the corpus directory, recursively, sorted by
/// path so document indices are stable.
fn list_documents(corpus_dir: &Path) -> Result<Vec<PathBuf>> {
    if !corpus_dir.is_dir() {
        return Err(PredictError::InvalidArgument(format!(
            "{} is not a directory",
            corpus_dir.display()
        )));
    }
    let mut documents = Vec::new();
    let mut pending = vec![corpus_dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                documents.push(path);
            }
        }
    }
    documents.sort();
    Ok(documents)
}

/// A stage that completed zero documents leaves nothing for the next one.
fn ensure_progress(stage: &str, completed: usize) -> Result<()> {
    if completed == 0 {
        return Err(PredictError::InvalidArgument(format!(
            "stage {} completed no documents",
            stage
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_parse() {
        assert_eq!(
            "parser".parse::<TrainingStep>().unwrap(),
            TrainingStep::Parser
        );
        assert_eq!(
            "token-convert".parse::<TrainingStep>().unwrap(),
            TrainingStep::TokenConvert
        );
        assert_eq!(
            "NGRAM_DICTIONARY".parse::<TrainingStep>().unwrap(),
            TrainingStep::NgramDictionary
        );
        assert!("tokenize".parse::<TrainingStep>().is_err());
    }

    #[test]
    fn steps_are_ordered() {
        assert!(TrainingStep::Parser < TrainingStep::TokenConvert);
        assert!(TrainingStep::WordsDictionary < TrainingStep::NgramDictionary);
    }

    #[test]
    fn semantic_step_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let trainer =
            Trainer::new(TrainingConfiguration::default(), dir.path().join("work")).unwrap();
        let err = trainer
            .run(
                dir.path(),
                &dir.path().join("w.pwd"),
                &dir.path().join("n.pnd"),
                TrainingStep::SemanticDictionary,
            )
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidArgument(_)));
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        let trainer =
            Trainer::new(TrainingConfiguration::default(), dir.path().join("work")).unwrap();
        let err = trainer
            .run(
                &corpus,
                &dir.path().join("w.pwd"),
                &dir.path().join("n.pnd"),
                TrainingStep::Parser,
            )
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidArgument(_)));
    }
}

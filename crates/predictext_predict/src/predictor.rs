//! The word predictor.
//!
//! Owns the loaded models and turns raw text into ranked predictions:
//!
//! 1. tokenize and fold the input (n-gram matcher preset)
//! 2. detect the started word prefix and its dictionary candidates
//! 3. build the context prefix of word ids, START-padded at sentence start
//! 4. gather candidates from the baseline and dynamic tries at decreasing
//!    orders until enough distinct candidates accumulate
//! 5. score: blended model probability × word factor × user-word recency ×
//!    correction penalty
//! 6. deduplicate, rank (stable), truncate, render display forms
//!
//! A failed prediction logs a warning and returns an empty result; errors
//! never cross the prediction API.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::{FxHashMap, FxHashSet};

use predictext_base::{PredictError, Result, TagId, Token, WordId, FIRST_WORD_ID};
use predictext_language::{convert_tokens, tokenize_str, FrenchModel, LanguageModel};
use predictext_lexicon::{BiIntegerKey, NextWord, WordDictionary};
use predictext_ngram::{
    DynamicNGramDictionary, NGramDictionary, StaticNGramDictionary, DEFAULT_DISCOUNT,
};

use crate::correction::CorrectionRuleNode;
use crate::parameter::PredictionParameter;
use crate::prefix::{detect_word_prefix, WordPrefixDetected};

/// Gather this many times the requested count before ranking, so weak
/// candidates can still be displaced.
const CANDIDATE_FACTOR: usize = 4;

/// Weight of the user-word recency bonus.
const RECENCY_BONUS: f64 = 0.25;

/// One ranked prediction.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub word_id: WordId,
    /// Raw surface (compound pairs joined).
    pub text: String,
    /// Surface re-cased for its sentence position.
    pub display: String,
    /// The part left to type after the detected prefix.
    pub completion: String,
    pub score: f64,
    pub debug: Option<String>,
}

/// The outcome of one prediction call.
#[derive(Debug, Default)]
pub struct PredictionResult {
    pub predictions: Vec<Prediction>,
    /// The detected prefix, when a word was in progress.
    pub prefix: Option<String>,
}

impl PredictionResult {
    fn empty() -> Self {
        Self::default()
    }
}

/// Prediction engine over one trained model and one user model.
pub struct WordPredictor {
    dictionary: WordDictionary,
    baseline: StaticNGramDictionary,
    dynamic: Option<DynamicNGramDictionary>,
    model: FrenchModel,
    parameter: PredictionParameter,
    correction_root: Option<CorrectionRuleNode>,
    dynamic_dirty: bool,
}

impl WordPredictor {
    /// Assembles a predictor, verifying that the n-gram file matches the
    /// word dictionary.
    pub fn new(
        dictionary: WordDictionary,
        baseline: StaticNGramDictionary,
        model: FrenchModel,
        parameter: PredictionParameter,
    ) -> Result<Self> {
        baseline.check_word_dictionary(dictionary.id_bound())?;
        Ok(WordPredictor {
            dictionary,
            baseline,
            dynamic: None,
            model,
            parameter,
            correction_root: Some(CorrectionRuleNode::accents()),
            dynamic_dirty: false,
        })
    }

    /// Loads the two model files and assembles a predictor.
    pub fn open(
        word_dictionary_path: &Path,
        ngram_dictionary_path: &Path,
        parameter: PredictionParameter,
    ) -> Result<Self> {
        let dictionary = WordDictionary::load(word_dictionary_path)?;
        let baseline = StaticNGramDictionary::open(ngram_dictionary_path)?;
        Self::new(dictionary, baseline, FrenchModel::new(), parameter)
    }

    /// Replaces the correction rule tree.
    pub fn set_correction_rules(&mut self, root: CorrectionRuleNode) {
        self.correction_root = Some(root);
    }

    pub fn dictionary(&self) -> &WordDictionary {
        &self.dictionary
    }

    pub fn parameter(&self) -> &PredictionParameter {
        &self.parameter
    }

    /// Persists the user words (gzip word format, user records only).
    pub fn save_user_dictionary(&self, path: &Path) -> Result<()> {
        self.dictionary.save_user_dictionary(path)
    }

    /// Merges a previously saved user dictionary.
    pub fn load_user_dictionary(&mut self, path: &Path) -> Result<()> {
        self.dictionary.load_user_dictionary(path)
    }

    /// Persists the dynamic model with its counts.
    pub fn save_dynamic_model(&self, path: &Path) -> Result<()> {
        match &self.dynamic {
            Some(dynamic) => dynamic.save_dynamic(path),
            None => Err(PredictError::InvalidArgument(
                "no dynamic model to save".into(),
            )),
        }
    }

    /// Reopens a previously saved dynamic model.
    pub fn load_dynamic_model(&mut self, path: &Path) -> Result<()> {
        self.dynamic = Some(DynamicNGramDictionary::open(path)?);
        self.dynamic_dirty = false;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Prediction
    // ------------------------------------------------------------------

    /// Predicts up to `count` completions for the text before `caret`
    /// (byte position; `None` means end of text). Word ids in `exclusions`
    /// are never proposed. Errors abort this call only and yield an empty
    /// result.
    pub fn predict(
        &mut self,
        text: &str,
        caret: Option<usize>,
        count: usize,
        exclusions: &FxHashSet<WordId>,
    ) -> PredictionResult {
        match self.try_predict(text, caret, count, exclusions) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("prediction aborted: {}", e);
                PredictionResult::empty()
            }
        }
    }

    fn try_predict(
        &mut self,
        text: &str,
        caret: Option<usize>,
        count: usize,
        exclusions: &FxHashSet<WordId>,
    ) -> Result<PredictionResult> {
        if count == 0 {
            return Err(PredictError::InvalidArgument(
                "requested zero predictions".into(),
            ));
        }
        let text = clip_at_caret(text, caret);
        let tokens = convert_tokens(
            tokenize_str(text, &self.model)?,
            self.model.ngram_matchers(),
        )?;
        self.refresh_dynamic()?;

        let prefix = detect_word_prefix(
            &tokens,
            &self.dictionary,
            &self.parameter,
            self.correction_root.as_ref(),
            exclusions,
            count * CANDIDATE_FACTOR,
        );
        let consumed = prefix.as_ref().map(|p| p.token_count).unwrap_or(0);
        let (context, sentence_start) =
            self.build_context(&tokens[..tokens.len() - consumed])?;

        let mut candidates = self.gather(&context, prefix.as_ref(), count, exclusions);
        if prefix.is_some() {
            self.add_compound_suggestions(&mut candidates, exclusions);
        }
        self.score(&mut candidates, &context);

        let mut ranked: Vec<NextWord> = candidates.into_values().collect();
        ranked.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.word.cmp(&b.word))
                .then_with(|| a.second_word.cmp(&b.second_word))
        });
        ranked.truncate(count);

        let prefix_text = prefix.map(|p| p.longest_word_prefix);
        let predictions = ranked
            .into_iter()
            .filter_map(|next| self.render(next, sentence_start, prefix_text.as_deref()))
            .collect();
        Ok(PredictionResult {
            predictions,
            prefix: prefix_text,
        })
    }

    /// Builds the id context before the freeze point: walk back, keep
    /// non-separators, stop at a sentence boundary, left-pad with START.
    fn build_context(&mut self, tokens: &[Token]) -> Result<(Vec<WordId>, bool)> {
        let length = self.baseline.max_order().saturating_sub(1);
        let unknown = TagId::Unknown.word_id();
        let mut collected: Vec<WordId> = Vec::with_capacity(length);
        let mut sentence_start = true;

        for (index, token) in tokens.iter().enumerate().rev() {
            if collected.len() >= length || token.is_sentence_separator() {
                break;
            }
            if token.is_separator() {
                continue;
            }
            sentence_start = false;
            let mut id = self
                .dictionary
                .word_id_for_token(token)
                .unwrap_or(unknown);
            // The first and last tokens are never auto-added.
            let interior = index != 0 && index + 1 != tokens.len();
            if id == unknown && interior && self.parameter.add_new_words_to_user_dictionary {
                if let Token::Word(text) = token {
                    id = self.dictionary.put_user_word(text)?;
                }
            }
            collected.push(id);
        }

        let start = TagId::Start.word_id();
        let mut context = vec![start; length - collected.len()];
        context.extend(collected.into_iter().rev());
        Ok((context, sentence_start))
    }

    /// Gathers candidates from both tries at decreasing orders until
    /// enough distinct ones accumulate. Lower orders only ever add.
    fn gather(
        &self,
        context: &[WordId],
        prefix: Option<&WordPrefixDetected>,
        count: usize,
        exclusions: &FxHashSet<WordId>,
    ) -> FxHashMap<BiIntegerKey, NextWord> {
        let mut candidates = prefix.map(|p| p.words.clone()).unwrap_or_default();
        let prefix_lower = prefix.map(|p| p.longest_word_prefix.to_lowercase());
        let max_order = self.baseline.max_order();

        for order in (1..=max_order).rev() {
            if candidates.len() >= count {
                break;
            }
            let context_len = order - 1;
            if context_len > context.len() {
                continue;
            }
            let slice = &context[context.len() - context_len..];
            let mut found = self.baseline.next_words(slice);
            if let Some(dynamic) = &self.dynamic {
                found.extend(dynamic.next_words(slice));
            }
            for (word_id, _) in found {
                self.consider(word_id, &prefix_lower, exclusions, &mut candidates);
            }
        }
        candidates
    }

    fn consider(
        &self,
        word_id: WordId,
        prefix_lower: &Option<String>,
        exclusions: &FxHashSet<WordId>,
        candidates: &mut FxHashMap<BiIntegerKey, NextWord>,
    ) {
        if word_id < FIRST_WORD_ID || exclusions.contains(&word_id) {
            return;
        }
        let word = match self.dictionary.get_word_by_id(word_id) {
            Some(word) => word,
            None => return,
        };
        if !word.is_valid_for_prediction(self.parameter.min_use_count_to_validate_new_word) {
            return;
        }
        if let Some(prefix) = prefix_lower {
            let matches = word
                .text()
                .map(|t| t.to_lowercase().starts_with(prefix.as_str()))
                .unwrap_or(false);
            if !matches {
                return;
            }
        }
        candidates
            .entry(BiIntegerKey::single(word_id))
            .or_insert_with(|| {
                let mut next = NextWord::single(word_id);
                next.factor = word.prob_factor();
                next
            });
    }

    /// Elision candidates (`c'`, `l'`) spawn a compound suggestion with
    /// their most likely continuation (`c'est`).
    fn add_compound_suggestions(
        &self,
        candidates: &mut FxHashMap<BiIntegerKey, NextWord>,
        exclusions: &FxHashSet<WordId>,
    ) {
        let elisions: Vec<(WordId, f64)> = candidates
            .values()
            .filter(|next| next.second_word.is_none())
            .filter_map(|next| {
                let word = self.dictionary.get_word_by_id(next.word)?;
                let text = word.text()?;
                text.ends_with('\'').then_some((next.word, next.factor))
            })
            .collect();
        for (first, factor) in elisions {
            let follower = self
                .baseline
                .next_words(&[first])
                .into_iter()
                .filter(|&(w, _)| w >= FIRST_WORD_ID && !exclusions.contains(&w))
                .filter(|&(w, _)| {
                    self.dictionary
                        .get_word_by_id(w)
                        .map(|word| {
                            word.is_valid_for_prediction(
                                self.parameter.min_use_count_to_validate_new_word,
                            )
                        })
                        .unwrap_or(false)
                })
                .max_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((second, _)) = follower {
                let mut compound = NextWord::compound(first, second, false);
                compound.factor = factor;
                candidates.entry(compound.key()).or_insert(compound);
            }
        }
    }

    /// Fills each candidate's probability: blended model probability,
    /// word factor, recency bonus and correction penalty.
    fn score(&self, candidates: &mut FxHashMap<BiIntegerKey, NextWord>, context: &[WordId]) {
        let mixture = self.parameter.dynamic_model_mixture.clamp(0.0, 1.0);
        for next in candidates.values_mut() {
            let base = self.baseline.get_probability(context, next.word);
            let blended = match &self.dynamic {
                Some(dynamic) => {
                    (1.0 - mixture) * base + mixture * dynamic.get_probability(context, next.word)
                }
                None => base,
            };
            let recency = self.recency_bonus(next.word);
            let penalty = 1.0 / (1.0 + next.correction_cost);
            next.probability = blended * next.factor * recency * penalty;
            if self.parameter.enable_debug_information {
                next.debug = Some(format!(
                    "base={:.3e} blended={:.3e} factor={:.2} recency={:.2} penalty={:.2}",
                    base, blended, next.factor, recency, penalty
                ));
            }
        }
    }

    fn recency_bonus(&self, word_id: WordId) -> f64 {
        let last_use = self
            .dictionary
            .get_word_by_id(word_id)
            .and_then(|w| w.last_use_epoch_millis());
        match last_use {
            Some(millis) => {
                let age_days = (now_millis().saturating_sub(millis)).max(0) as f64 / 86_400_000.0;
                1.0 + RECENCY_BONUS / (1.0 + age_days)
            }
            None => 1.0,
        }
    }

    fn render(
        &self,
        next: NextWord,
        sentence_start: bool,
        prefix: Option<&str>,
    ) -> Option<Prediction> {
        let first = self.dictionary.get_word_by_id(next.word)?.text()?;
        let mut text = first.to_string();
        if let Some(second_id) = next.second_word {
            let second = self.dictionary.get_word_by_id(second_id)?.text()?;
            if next.space_between {
                text.push(' ');
            }
            text.push_str(second);
        }
        let display = if sentence_start {
            capitalize_first(&text)
        } else {
            text.clone()
        };
        let completion = match prefix {
            Some(p) => display.chars().skip(p.chars().count()).collect(),
            None => display.clone(),
        };
        Some(Prediction {
            word_id: next.word,
            text,
            display,
            completion,
            score: next.probability,
            debug: next.debug,
        })
    }

    // ------------------------------------------------------------------
    // Dynamic model training
    // ------------------------------------------------------------------

    /// Feeds user text into the dynamic model: word usage counts in the
    /// dictionary, n-grams of every order in the dynamic trie. With
    /// `whole_sentence` the text is known to start at a sentence boundary;
    /// otherwise the leading fragment is treated as a continuation and
    /// gets no START tag.
    pub fn train_dynamic_model(&mut self, text: &str, whole_sentence: bool) -> Result<()> {
        let tokens = convert_tokens(
            tokenize_str(text, &self.model)?,
            self.model.ngram_matchers(),
        )?;
        for token in &tokens {
            if let Token::Word(word) = token {
                self.dictionary.put_user_word(word)?;
            }
        }

        let max_order = self.baseline.max_order();
        if self.dynamic.is_none() {
            self.dynamic = Some(DynamicNGramDictionary::new(max_order)?);
        }
        let dynamic = self.dynamic.as_mut().expect("just attached");
        let start = TagId::Start.word_id();
        let unknown = TagId::Unknown.word_id();

        // A continuation fragment starts mid-sentence, so its first
        // sentence carries no START tag; later sentences always do.
        let mut sentence: Vec<WordId> = if whole_sentence { vec![start] } else { Vec::new() };
        let mut flush = |sentence: &mut Vec<WordId>| -> Result<()> {
            let has_words = sentence.iter().any(|&id| id != start);
            if has_words {
                for end in 0..sentence.len() {
                    for order in 1..=max_order.min(end + 1) {
                        let window = &sentence[end + 1 - order..=end];
                        if window.contains(&unknown) {
                            continue;
                        }
                        dynamic.put_and_increment_by(window, 1)?;
                    }
                }
            }
            sentence.clear();
            sentence.push(start);
            Ok(())
        };

        for token in &tokens {
            if token.is_sentence_separator() {
                flush(&mut sentence)?;
                continue;
            }
            if token.is_separator() {
                continue;
            }
            if let Some(id) = self.dictionary.word_id_for_token(token) {
                sentence.push(id);
            }
        }
        flush(&mut sentence)?;

        self.dynamic_dirty = true;
        Ok(())
    }

    /// True once a dynamic model exists.
    pub fn has_dynamic_model(&self) -> bool {
        self.dynamic.is_some()
    }

    fn refresh_dynamic(&mut self) -> Result<()> {
        if self.dynamic_dirty {
            if let Some(dynamic) = self.dynamic.as_mut() {
                let discounts = vec![DEFAULT_DISCOUNT; dynamic.max_order()];
                dynamic.update_probabilities(&discounts)?;
            }
            self.dynamic_dirty = false;
        }
        Ok(())
    }
}

fn clip_at_caret(text: &str, caret: Option<usize>) -> &str {
    match caret {
        None => text,
        Some(position) => {
            let mut boundary = position.min(text.len());
            while !text.is_char_boundary(boundary) {
                boundary -= 1;
            }
            &text[..boundary]
        }
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

//! End-to-end predictor scenarios over small in-test corpora.
//!
//! The helper below mirrors the training pipeline at miniature scale:
//! tokenize, fold, build the vocabulary with a permissive policy, count
//! n-grams, smooth, serialize, reopen as the static baseline.

use rustc_hash::FxHashSet;
use tempfile::TempDir;

use predictext_base::{TagId, Token, WordId};
use predictext_language::{convert_tokens, tokenize_str, FrenchModel, LanguageModel};
use predictext_lexicon::{CasePolicy, WordDictionaryBuilder};
use predictext_ngram::{
    DynamicNGramDictionary, NGramDictionary, SmoothingConfig, StaticNGramDictionary,
};
use predictext_predict::{PredictionParameter, WordPredictor};

const ORDER: usize = 4;

fn build_predictor(corpus: &str, parameter: PredictionParameter) -> (TempDir, WordPredictor) {
    let model = FrenchModel::new();
    let tokens =
        convert_tokens(tokenize_str(corpus, &model).unwrap(), model.ngram_matchers()).unwrap();

    let mut builder = WordDictionaryBuilder::new();
    for token in &tokens {
        builder.count_token(token);
    }
    let policy = CasePolicy {
        directly_valid_word_count_threshold: 1,
        ..CasePolicy::default()
    };
    let (dictionary, resolution) = builder.build(&policy, None);

    let resolved: Vec<Token> = tokens
        .iter()
        .map(|token| match token {
            Token::Word(w) => match resolution.get(w.as_str()).cloned().flatten() {
                Some(form) => Token::Word(form),
                None => Token::Tag(TagId::Unknown),
            },
            other => other.clone(),
        })
        .collect();

    let mut trie = DynamicNGramDictionary::new(ORDER).unwrap();
    let start = TagId::Start.word_id();
    let unknown = TagId::Unknown.word_id();
    let mut sentence: Vec<WordId> = vec![start];
    let mut flush = |sentence: &mut Vec<WordId>, trie: &mut DynamicNGramDictionary| {
        if sentence.len() > 1 {
            for end in 0..sentence.len() {
                for order in 1..=ORDER.min(end + 1) {
                    let window = &sentence[end + 1 - order..=end];
                    if !window.contains(&unknown) {
                        trie.put_and_increment_by(window, 1).unwrap();
                    }
                }
            }
        }
        sentence.clear();
        sentence.push(start);
    };
    for token in &resolved {
        if token.is_sentence_separator() {
            flush(&mut sentence, &mut trie);
        } else if !token.is_separator() {
            sentence.push(dictionary.word_id_for_token(token).unwrap());
        }
    }
    flush(&mut sentence, &mut trie);

    let discounts = trie.compute_discounts(&SmoothingConfig::default());
    trie.update_probabilities(&discounts).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.pnd");
    trie.save_static(&path).unwrap();
    let baseline = StaticNGramDictionary::open(&path).unwrap();
    let predictor =
        WordPredictor::new(dictionary, baseline, FrenchModel::new(), parameter).unwrap();
    (dir, predictor)
}

const DOG_CORPUS: &str =
    "le chien mange. le chien qui mange. un chien doit manger. le chien part. mon chien va.";

fn texts(predictions: &[predictext_predict::Prediction]) -> Vec<&str> {
    predictions.iter().map(|p| p.text.as_str()).collect()
}

#[test]
fn empty_input_proposes_sentence_initial_words() {
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    let result = predictor.predict("", None, 5, &FxHashSet::default());
    let texts = texts(&result.predictions);
    // "le" starts three of five sentences; it must come first.
    assert_eq!(texts.first(), Some(&"le"));
    assert!(texts.contains(&"un"));
    assert!(texts.contains(&"mon"));
    assert!(result.prefix.is_none());
}

#[test]
fn sentence_start_predictions_are_capitalized_for_display() {
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    let result = predictor.predict("", None, 3, &FxHashSet::default());
    let first = &result.predictions[0];
    assert_eq!(first.text, "le");
    assert_eq!(first.display, "Le");
}

#[test]
fn context_narrows_the_candidates() {
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    let result = predictor.predict("le chien ", None, 2, &FxHashSet::default());
    let texts = texts(&result.predictions);
    // After "le chien" the corpus continues with mange or qui.
    assert!(texts.contains(&"mange") || texts.contains(&"qui"));
    assert!(!texts.contains(&"chien"));
}

#[test]
fn started_prefix_filters_and_completes() {
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    let result = predictor.predict("le chien m", None, 5, &FxHashSet::default());
    assert_eq!(result.prefix.as_deref(), Some("m"));
    for prediction in &result.predictions {
        assert!(prediction.text.starts_with('m'), "{:?}", prediction.text);
    }
    let texts = texts(&result.predictions);
    assert!(texts.contains(&"mange"));
    // completion omits the typed part
    let mange = result
        .predictions
        .iter()
        .find(|p| p.text == "mange")
        .unwrap();
    assert_eq!(mange.completion, "ange");
}

#[test]
fn caret_freezes_the_context() {
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    // Only "le chi" is before the caret.
    let result = predictor.predict("le chien mange", Some(6), 3, &FxHashSet::default());
    assert_eq!(result.prefix.as_deref(), Some("chi"));
    assert!(texts(&result.predictions).contains(&"chien"));
}

#[test]
fn exclusions_are_never_proposed() {
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    let chien = predictor.dictionary().get_word("chien").unwrap().id();
    let result = predictor.predict("le ", None, 5, &[chien].into_iter().collect());
    assert!(!texts(&result.predictions).contains(&"chien"));
}

#[test]
fn zero_count_yields_an_empty_result() {
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    let result = predictor.predict("le ", None, 0, &FxHashSet::default());
    assert!(result.predictions.is_empty());
}

#[test]
fn prediction_is_deterministic() {
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    let a = predictor.predict("le ", None, 5, &FxHashSet::default());
    let b = predictor.predict("le ", None, 5, &FxHashSet::default());
    assert_eq!(texts(&a.predictions), texts(&b.predictions));
}

#[test]
fn elision_prefix_offers_the_compound() {
    let corpus = "c'est bien. c'est vrai. c'est la vie. ce chat dort.";
    let (_dir, mut predictor) = build_predictor(corpus, PredictionParameter::default());
    let result = predictor.predict("c", None, 6, &FxHashSet::default());
    let texts = texts(&result.predictions);
    assert!(texts.contains(&"c'est"), "got {:?}", texts);
}

#[test]
fn accent_correction_recovers_accented_candidates() {
    let corpus = "il était une fois. il est tard. il était ici. elle est partie.";
    let mut parameter = PredictionParameter::default();
    parameter.enable_word_correction = true;
    let (_dir, mut predictor) = build_predictor(corpus, parameter);
    let result = predictor.predict("il e", None, 5, &FxHashSet::default());
    let texts = texts(&result.predictions);
    assert!(texts.contains(&"est"), "got {:?}", texts);
    assert!(texts.contains(&"était"), "got {:?}", texts);
}

#[test]
fn correction_stays_off_without_the_flag() {
    let corpus = "il était une fois. il est tard.";
    let (_dir, mut predictor) = build_predictor(corpus, PredictionParameter::default());
    let result = predictor.predict("il e", None, 5, &FxHashSet::default());
    assert!(!texts(&result.predictions).contains(&"était"));
}

#[test]
fn dynamic_training_promotes_new_words() {
    let corpus = "je vais à la maison. je vais à la plage.";
    let (_dir, mut predictor) = build_predictor(corpus, PredictionParameter::default());

    let before = predictor.predict("je vais à la ", None, 3, &FxHashSet::default());
    assert!(!texts(&before.predictions).contains(&"gare"));

    predictor.train_dynamic_model("je vais à la gare", false).unwrap();
    assert!(predictor.has_dynamic_model());

    let after = predictor.predict("je vais à la ", None, 3, &FxHashSet::default());
    assert!(
        texts(&after.predictions).contains(&"gare"),
        "got {:?}",
        texts(&after.predictions)
    );
}

#[test]
fn dynamic_training_strengthens_known_continuations() {
    let corpus = "je vais à la maison. je vais à la plage.";
    let (_dir, mut predictor) = build_predictor(corpus, PredictionParameter::default());

    let score_of = |result: &predictext_predict::PredictionResult, text: &str| {
        result
            .predictions
            .iter()
            .find(|p| p.text == text)
            .map(|p| p.score)
    };

    let before = predictor.predict("je vais à la ", None, 3, &FxHashSet::default());
    let plage_before = score_of(&before, "plage").unwrap();

    for _ in 0..3 {
        predictor.train_dynamic_model("je vais à la plage", false).unwrap();
    }
    let after = predictor.predict("je vais à la ", None, 3, &FxHashSet::default());
    let plage_after = score_of(&after, "plage").unwrap();
    assert!(
        plage_after > plage_before,
        "{} should exceed {}",
        plage_after,
        plage_before
    );
}

#[test]
fn debug_information_is_attached_on_request() {
    let mut parameter = PredictionParameter::default();
    parameter.enable_debug_information = true;
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, parameter);
    let result = predictor.predict("le ", None, 3, &FxHashSet::default());
    assert!(result.predictions.iter().all(|p| p.debug.is_some()));
}

#[test]
fn user_dictionary_round_trips_through_the_predictor() {
    let (_dir, mut predictor) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    predictor.train_dynamic_model("le wombat dort", false).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let user_path = dir.path().join("user.pwd");
    let dynamic_path = dir.path().join("user.pnd");
    predictor.save_user_dictionary(&user_path).unwrap();
    predictor.save_dynamic_model(&dynamic_path).unwrap();

    let (_dir2, mut fresh) = build_predictor(DOG_CORPUS, PredictionParameter::default());
    fresh.load_user_dictionary(&user_path).unwrap();
    fresh.load_dynamic_model(&dynamic_path).unwrap();
    assert!(fresh.dictionary().get_word("wombat").is_some());
}

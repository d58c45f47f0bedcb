//! Full pipeline runs over miniature corpora: corpus directory in, word
//! dictionary and static n-gram dictionary out.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use predictext_base::{TagId, WordId};
use predictext_lexicon::WordDictionary;
use predictext_ngram::{NGramDictionary, StaticNGramDictionary};
use predictext_train::{Trainer, TrainingConfiguration, TrainingStep};

const DOG_CORPUS: &str =
    "le chien mange. le chien qui mange. un chien doit manger. le chien part. mon chien va.";

fn permissive_config() -> TrainingConfiguration {
    let json = r#"{
        "ngramOrder": 4,
        "pruningMethod": "NONE",
        "directlyValidWordCountThreshold": 1
    }"#;
    serde_json::from_str(json).unwrap()
}

struct Trained {
    _dir: TempDir,
    words_path: PathBuf,
    ngrams_path: PathBuf,
    working_dir: PathBuf,
    corpus_dir: PathBuf,
}

fn train(documents: &[&str], config: TrainingConfiguration) -> Trained {
    let dir = tempfile::tempdir().unwrap();
    let corpus_dir = dir.path().join("corpus");
    fs::create_dir_all(&corpus_dir).unwrap();
    for (i, text) in documents.iter().enumerate() {
        fs::write(corpus_dir.join(format!("doc{}.txt", i)), text).unwrap();
    }
    let words_path = dir.path().join("model.pwd");
    let ngrams_path = dir.path().join("model.pnd");
    let working_dir = dir.path().join("work");

    let trainer = Trainer::new(config, working_dir.clone()).unwrap();
    trainer
        .run(&corpus_dir, &words_path, &ngrams_path, TrainingStep::Parser)
        .unwrap();
    Trained {
        _dir: dir,
        words_path,
        ngrams_path,
        working_dir,
        corpus_dir,
    }
}

fn id_of(dictionary: &WordDictionary, text: &str) -> WordId {
    dictionary
        .get_word(text)
        .unwrap_or_else(|| panic!("'{}' not in dictionary", text))
        .id()
}

fn follower_texts(
    ngrams: &StaticNGramDictionary,
    dictionary: &WordDictionary,
    prefix: &[WordId],
) -> Vec<String> {
    ngrams
        .next_words(prefix)
        .iter()
        .filter_map(|&(w, _)| dictionary.get_word_by_id(w))
        .filter_map(|w| w.text().map(str::to_string))
        .collect()
}

#[test]
fn training_produces_both_model_files() {
    let trained = train(&[DOG_CORPUS], permissive_config());
    assert!(trained.words_path.exists());
    assert!(trained.ngrams_path.exists());

    let dictionary = WordDictionary::load(&trained.words_path).unwrap();
    assert!(dictionary.get_word("chien").is_some());
    let ngrams = StaticNGramDictionary::open(&trained.ngrams_path).unwrap();
    assert_eq!(ngrams.max_order(), 4);
    ngrams.check_word_dictionary(dictionary.id_bound()).unwrap();
}

#[test]
fn trained_trie_lists_corpus_continuations() {
    let trained = train(&[DOG_CORPUS], permissive_config());
    let dictionary = WordDictionary::load(&trained.words_path).unwrap();
    let ngrams = StaticNGramDictionary::open(&trained.ngrams_path).unwrap();

    let le = id_of(&dictionary, "le");
    let chien = id_of(&dictionary, "chien");

    let after_le_chien = follower_texts(&ngrams, &dictionary, &[le, chien]);
    assert!(after_le_chien.contains(&"mange".to_string()));
    assert!(after_le_chien.contains(&"qui".to_string()));
    for text in &after_le_chien {
        assert!(
            ["mange", "qui", "part"].contains(&text.as_str()),
            "unexpected follower {}",
            text
        );
    }

    let after_chien = follower_texts(&ngrams, &dictionary, &[chien]);
    for expected in ["mange", "qui", "doit"] {
        assert!(
            after_chien.contains(&expected.to_string()),
            "missing follower {}",
            expected
        );
    }
}

#[test]
fn start_tag_children_are_the_sentence_initial_words() {
    let trained = train(&[DOG_CORPUS], permissive_config());
    let dictionary = WordDictionary::load(&trained.words_path).unwrap();
    let ngrams = StaticNGramDictionary::open(&trained.ngrams_path).unwrap();

    let initials = follower_texts(&ngrams, &dictionary, &[TagId::Start.word_id()]);
    let mut sorted = initials.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["le", "mon", "un"]);
}

#[test]
fn word_ids_are_deterministic_across_runs() {
    let pairs = |trained: &Trained| {
        let dictionary = WordDictionary::load(&trained.words_path).unwrap();
        let mut pairs: Vec<(String, WordId)> = dictionary
            .all_words()
            .filter_map(|w| w.text().map(|t| (t.to_string(), w.id())))
            .collect();
        pairs.sort();
        pairs
    };
    let first = train(&[DOG_CORPUS], permissive_config());
    let second = train(&[DOG_CORPUS], permissive_config());
    assert_eq!(pairs(&first), pairs(&second));
}

#[test]
fn static_probabilities_normalize_over_the_vocabulary() {
    let trained = train(&[DOG_CORPUS], permissive_config());
    let dictionary = WordDictionary::load(&trained.words_path).unwrap();
    let ngrams = StaticNGramDictionary::open(&trained.ngrams_path).unwrap();

    let vocabulary: Vec<WordId> = ngrams.next_words(&[]).iter().map(|&(w, _)| w).collect();
    let le = id_of(&dictionary, "le");
    let chien = id_of(&dictionary, "chien");
    for prefix in [vec![], vec![le], vec![le, chien]] {
        let total: f64 = vocabulary
            .iter()
            .map(|&w| ngrams.get_probability(&prefix, w))
            .sum();
        // f32 storage bounds the achievable precision.
        assert!((total - 1.0).abs() < 1e-5, "prefix {:?}: {}", prefix, total);
    }
}

#[test]
fn multiple_documents_merge_their_counts() {
    let trained = train(
        &["le chien mange.", "le chien dort.", "le chat mange."],
        permissive_config(),
    );
    let dictionary = WordDictionary::load(&trained.words_path).unwrap();
    let ngrams = StaticNGramDictionary::open(&trained.ngrams_path).unwrap();
    let le = id_of(&dictionary, "le");
    let followers = follower_texts(&ngrams, &dictionary, &[le]);
    let mut sorted = followers.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["chat", "chien"]);
}

#[test]
fn order_count_pruning_drops_rare_bigrams() {
    let mut config = permissive_config();
    config.pruning_method = predictext_train::PruningMethodName::OrderCount;
    config.ngram_pruning_order_count_thresholds = vec![-1, 2, 3, 4];
    let trained = train(&[DOG_CORPUS], config);
    let dictionary = WordDictionary::load(&trained.words_path).unwrap();
    let ngrams = StaticNGramDictionary::open(&trained.ngrams_path).unwrap();

    let chien = id_of(&dictionary, "chien");
    let le = id_of(&dictionary, "le");
    // "le chien" occurs three times: kept. "un chien" occurs once: pruned.
    let un = id_of(&dictionary, "un");
    assert!(ngrams.child_frequency(&[le], chien).is_some());
    assert!(ngrams.child_frequency(&[un], chien).is_none());
    // unigrams survive the -1 threshold
    assert!(ngrams.child_frequency(&[], un).is_some());
}

#[test]
fn training_resumes_from_the_ngram_stage() {
    let trained = train(&[DOG_CORPUS], permissive_config());
    let before = fs::read(&trained.ngrams_path).unwrap();
    fs::remove_file(&trained.ngrams_path).unwrap();

    // Rebuild only the n-gram stage from the cached clean artifacts.
    let trainer = Trainer::new(permissive_config(), trained.working_dir.clone()).unwrap();
    trainer
        .run(
            &trained.corpus_dir,
            &trained.words_path,
            &trained.ngrams_path,
            TrainingStep::NgramDictionary,
        )
        .unwrap();
    let after = fs::read(&trained.ngrams_path).unwrap();
    assert_eq!(before, after);
}

#[test]
fn unreadable_documents_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_dir = dir.path().join("corpus");
    fs::create_dir_all(&corpus_dir).unwrap();
    fs::write(corpus_dir.join("good.txt"), DOG_CORPUS).unwrap();
    // Invalid UTF-8 makes the parser stage fail for this document only.
    fs::write(corpus_dir.join("bad.txt"), [0xff, 0xfe, 0x20, 0xff]).unwrap();

    let trainer = Trainer::new(permissive_config(), dir.path().join("work")).unwrap();
    trainer
        .run(
            &corpus_dir,
            &dir.path().join("model.pwd"),
            &dir.path().join("model.pnd"),
            TrainingStep::Parser,
        )
        .unwrap();
    let dictionary = WordDictionary::load(&dir.path().join("model.pwd")).unwrap();
    assert!(dictionary.get_word("chien").is_some());
}

#[test]
fn base_word_dictionary_steers_casing() {
    let dir = tempfile::tempdir().unwrap();
    let base_path = dir.path().join("base.json");
    fs::write(
        &base_path,
        r#"[ { "word": "Paris", "frequency": 8e-5 } ]"#,
    )
    .unwrap();

    let mut config = permissive_config();
    config.base_word_dictionary_path = Some(base_path);
    let trained = train(&["il visite paris. il visite paris encore."], config);
    let dictionary = WordDictionary::load(&trained.words_path).unwrap();
    assert!(dictionary.get_word("Paris").is_some());
    assert!(dictionary.get_word("paris").is_none());
}

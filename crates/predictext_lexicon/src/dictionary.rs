//! The word dictionary: bidirectional `text ↔ id` mapping.
//!
//! Ids are dense and stable within a session: the reserved band holds
//! equivalence classes and tags, regular vocabulary starts at
//! `FIRST_WORD_ID` and grows in insertion order. A secondary lowercase
//! index resolves case variants for prefix lookup.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::{FxHashMap, FxHashSet};

use predictext_base::{
    EquivalenceClassId, PredictError, Result, TagId, Token, WordId, FIRST_WORD_ID,
};

use crate::codec;
use crate::next_word::{BiIntegerKey, NextWord};
use crate::word::{SimpleWord, UserWord, Word};

/// The vocabulary of one trained model plus its runtime user words.
pub struct WordDictionary {
    words: FxHashMap<WordId, Word>,
    ids_by_text: FxHashMap<String, WordId>,
    ids_by_lower: FxHashMap<String, Vec<WordId>>,
    next_id: WordId,
}

impl WordDictionary {
    /// An empty dictionary holding only the reserved entries.
    pub fn new() -> Self {
        let mut dict = WordDictionary {
            words: FxHashMap::default(),
            ids_by_text: FxHashMap::default(),
            ids_by_lower: FxHashMap::default(),
            next_id: FIRST_WORD_ID,
        };
        for id in 0..=EquivalenceClassId::MAX_ID as u8 {
            if let Some(class) = EquivalenceClassId::from_id(id) {
                dict.words.insert(class.word_id(), Word::Equivalence(class));
            }
        }
        for tag in [TagId::Start, TagId::Unknown] {
            dict.words.insert(tag.word_id(), Word::Tag(tag));
        }
        dict
    }

    /// Number of entries, reserved ones included.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// One past the highest assigned word id.
    pub fn id_bound(&self) -> WordId {
        self.next_id
    }

    pub fn all_words(&self) -> impl Iterator<Item = &Word> {
        self.words.values()
    }

    pub fn get_word(&self, text: &str) -> Option<&Word> {
        self.ids_by_text.get(text).and_then(|id| self.words.get(id))
    }

    pub fn get_word_by_id(&self, id: WordId) -> Option<&Word> {
        self.words.get(&id)
    }

    /// Resolves a token to its word id. Separators have no id in the
    /// n-gram domain; unknown surfaces resolve to the UNKNOWN tag.
    pub fn word_id_for_token(&self, token: &Token) -> Option<WordId> {
        match token {
            Token::Word(text) => Some(
                self.ids_by_text
                    .get(text.as_str())
                    .copied()
                    .unwrap_or_else(|| TagId::Unknown.word_id()),
            ),
            Token::Equivalence(class, _) => Some(class.word_id()),
            Token::Tag(tag) => Some(tag.word_id()),
            Token::Separator(_) => None,
        }
    }

    /// Inserts a system word built by the training policy. Returns the
    /// existing id when the surface is already present.
    pub fn add_system_word(&mut self, text: &str) -> WordId {
        if let Some(&id) = self.ids_by_text.get(text) {
            return id;
        }
        let id = self.take_id();
        self.index(text, id);
        self.words.insert(id, Word::Simple(SimpleWord::new(id, text)));
        id
    }

    /// Inserts or refreshes a user word. Reinserting an existing user word
    /// returns the same id and increments its usage counter; a surface
    /// already present as a system word keeps its id untouched.
    pub fn put_user_word(&mut self, text: &str) -> Result<WordId> {
        if text.trim().is_empty() {
            return Err(PredictError::InvalidArgument(
                "blank user word".into(),
            ));
        }
        if let Some(&id) = self.ids_by_text.get(text) {
            if let Some(Word::User(user)) = self.words.get_mut(&id) {
                user.usage_count += 1;
                user.last_use_epoch_millis = now_millis();
            }
            return Ok(id);
        }
        let id = self.take_id();
        self.index(text, id);
        self.words.insert(
            id,
            Word::User(UserWord {
                word: SimpleWord::new(id, text),
                usage_count: 1,
                last_use_epoch_millis: now_millis(),
            }),
        );
        Ok(id)
    }

    /// Collects valid vocabulary words whose lowercase surface starts with
    /// the lowercase prefix, capped at `wanted` entries (lowest ids first,
    /// for deterministic enumeration).
    pub fn valid_words_for_prediction_by_prefix(
        &self,
        prefix: &str,
        exclusions: &FxHashSet<WordId>,
        wanted: usize,
        min_use_count: i32,
    ) -> Result<FxHashMap<BiIntegerKey, NextWord>> {
        if prefix.trim().is_empty() {
            return Err(PredictError::InvalidArgument("blank prefix".into()));
        }
        let lower = prefix.to_lowercase();
        let mut ids: Vec<WordId> = self
            .ids_by_lower
            .iter()
            .filter(|(text, _)| text.starts_with(&lower))
            .flat_map(|(_, ids)| ids.iter().copied())
            .filter(|id| !exclusions.contains(id))
            .filter(|id| {
                self.words
                    .get(id)
                    .map(|w| w.is_valid_for_prediction(min_use_count))
                    .unwrap_or(false)
            })
            .collect();
        ids.sort_unstable();
        ids.truncate(wanted);

        let mut out = FxHashMap::default();
        for id in ids {
            let mut next = NextWord::single(id);
            next.factor = self.words[&id].prob_factor();
            out.insert(next.key(), next);
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Writes every entry to a gzip word file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut words: Vec<&Word> = self.words.values().collect();
        words.sort_by_key(|w| w.id());
        codec::write_words_file(path, words.into_iter())
    }

    /// Writes only the user words, same format.
    pub fn save_user_dictionary(&self, path: &Path) -> Result<()> {
        let mut words: Vec<&Word> = self
            .words
            .values()
            .filter(|w| w.is_user_word())
            .collect();
        words.sort_by_key(|w| w.id());
        codec::write_words_file(path, words.into_iter())
    }

    /// Reads a full dictionary file.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut dict = WordDictionary::new();
        for word in codec::read_words(reader)? {
            dict.insert_loaded(word);
        }
        Ok(dict)
    }

    /// Merges a user dictionary file into this dictionary.
    pub fn load_user_dictionary(&mut self, path: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        for word in codec::read_words(reader)? {
            if word.is_user_word() {
                self.insert_loaded(word);
            }
        }
        Ok(())
    }

    fn insert_loaded(&mut self, word: Word) {
        let id = word.id();
        if let Some(text) = word.text() {
            let text = text.to_string();
            if let Some(&existing) = self.ids_by_text.get(&text) {
                // Same surface from an earlier load keeps its id; user
                // records replace the stored state.
                self.words.insert(existing, relabel(word, existing));
                return;
            }
            self.index(&text, id);
        }
        self.words.insert(id, word);
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }

    fn take_id(&mut self) -> WordId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn index(&mut self, text: &str, id: WordId) {
        self.ids_by_text.insert(text.to_string(), id);
        self.ids_by_lower
            .entry(text.to_lowercase())
            .or_default()
            .push(id);
    }
}

impl Default for WordDictionary {
    fn default() -> Self {
        Self::new()
    }
}

fn relabel(word: Word, id: WordId) -> Word {
    match word {
        Word::Simple(mut w) => {
            w.id = id;
            Word::Simple(w)
        }
        Word::User(mut u) => {
            u.word.id = id;
            Word::User(u)
        }
        other => other,
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

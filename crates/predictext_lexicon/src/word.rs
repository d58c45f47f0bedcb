//! The word model.
//!
//! Four variants share an integer id: corpus words built at training time,
//! user words inserted at runtime, and the reserved equivalence-class and
//! tag words occupying the low id band. A word is *valid for prediction*
//! when it has been forced valid, or has not been forced invalid and is
//! either a system word or a user word typed often enough.

use predictext_base::{EquivalenceClassId, TagId, WordId};

/// A corpus word and its prediction state.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleWord {
    pub id: WordId,
    pub text: String,
    pub modified_by_user: bool,
    pub modified_by_system: bool,
    /// Multiplicative score factor applied at prediction time.
    pub prob_factor: f64,
    pub force_invalid: bool,
    pub force_valid: bool,
}

impl SimpleWord {
    pub fn new(id: WordId, text: impl Into<String>) -> Self {
        SimpleWord {
            id,
            text: text.into(),
            modified_by_user: false,
            modified_by_system: false,
            prob_factor: 1.0,
            force_invalid: false,
            force_valid: false,
        }
    }
}

/// A word added at runtime from user input.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWord {
    pub word: SimpleWord,
    pub usage_count: i32,
    pub last_use_epoch_millis: i64,
}

/// A dictionary entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    Simple(SimpleWord),
    User(UserWord),
    Equivalence(EquivalenceClassId),
    Tag(TagId),
}

impl Word {
    pub fn id(&self) -> WordId {
        match self {
            Word::Simple(w) => w.id,
            Word::User(u) => u.word.id,
            Word::Equivalence(c) => c.word_id(),
            Word::Tag(t) => t.word_id(),
        }
    }

    /// The displayable surface, if this entry has one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Word::Simple(w) => Some(&w.text),
            Word::User(u) => Some(&u.word.text),
            Word::Equivalence(_) | Word::Tag(_) => None,
        }
    }

    pub fn prob_factor(&self) -> f64 {
        match self {
            Word::Simple(w) => w.prob_factor,
            Word::User(u) => u.word.prob_factor,
            Word::Equivalence(_) | Word::Tag(_) => 1.0,
        }
    }

    pub fn is_user_word(&self) -> bool {
        matches!(self, Word::User(_))
    }

    /// Millisecond timestamp of the last user insertion, if any.
    pub fn last_use_epoch_millis(&self) -> Option<i64> {
        match self {
            Word::User(u) => Some(u.last_use_epoch_millis),
            _ => None,
        }
    }

    /// Whether the predictor may propose this word.
    ///
    /// `min_use_count` is the predictor parameter gating user words that
    /// have not yet been typed often enough.
    pub fn is_valid_for_prediction(&self, min_use_count: i32) -> bool {
        match self {
            Word::Simple(w) => w.force_valid || !w.force_invalid,
            Word::User(u) => {
                u.word.force_valid
                    || (!u.word.force_invalid && u.usage_count >= min_use_count)
            }
            Word::Equivalence(_) | Word::Tag(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(usage: i32) -> Word {
        Word::User(UserWord {
            word: SimpleWord::new(20, "gare"),
            usage_count: usage,
            last_use_epoch_millis: 0,
        })
    }

    #[test]
    fn simple_words_are_valid_by_default() {
        let w = Word::Simple(SimpleWord::new(18, "chien"));
        assert!(w.is_valid_for_prediction(2));
    }

    #[test]
    fn force_invalid_wins_over_default() {
        let mut s = SimpleWord::new(18, "chien");
        s.force_invalid = true;
        assert!(!Word::Simple(s).is_valid_for_prediction(0));
    }

    #[test]
    fn user_words_need_enough_uses() {
        assert!(!user(1).is_valid_for_prediction(2));
        assert!(user(2).is_valid_for_prediction(2));
    }

    #[test]
    fn force_valid_overrides_usage_count() {
        let mut u = UserWord {
            word: SimpleWord::new(20, "gare"),
            usage_count: 0,
            last_use_epoch_millis: 0,
        };
        u.word.force_valid = true;
        assert!(Word::User(u).is_valid_for_prediction(10));
    }

    #[test]
    fn reserved_entries_are_never_proposed() {
        assert!(!Word::Tag(TagId::Unknown).is_valid_for_prediction(0));
        assert!(!Word::Equivalence(EquivalenceClassId::Integer).is_valid_for_prediction(0));
    }
}

//! Control tags: sentence start and unknown word.
//!
//! Tag ids begin just above the equivalence-class band so the three id
//! families never collide.

use crate::equivalence::EquivalenceClassId;
use crate::WordId;

/// A control tag in the token stream and n-gram domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagId {
    /// Virtual token preceding the first word of every sentence.
    Start,
    /// Surface form that did not make it into the vocabulary.
    Unknown,
}

impl TagId {
    /// The tag id byte, also its word id.
    pub fn id(self) -> u8 {
        (self.word_id()) as u8
    }

    /// The reserved word id of this tag in every dictionary.
    pub fn word_id(self) -> WordId {
        match self {
            TagId::Start => EquivalenceClassId::MAX_ID + 1,
            TagId::Unknown => EquivalenceClassId::MAX_ID + 2,
        }
    }

    /// Looks a tag up by id byte.
    pub fn from_id(id: u8) -> Option<TagId> {
        match id as WordId {
            x if x == TagId::Start.word_id() => Some(TagId::Start),
            x if x == TagId::Unknown.word_id() => Some(TagId::Unknown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FIRST_WORD_ID;

    #[test]
    fn tags_sit_between_classes_and_vocabulary() {
        assert_eq!(TagId::Start.word_id(), EquivalenceClassId::MAX_ID + 1);
        assert_eq!(TagId::Unknown.word_id(), EquivalenceClassId::MAX_ID + 2);
        assert_eq!(FIRST_WORD_ID, TagId::Unknown.word_id() + 1);
    }

    #[test]
    fn ids_round_trip() {
        assert_eq!(TagId::from_id(TagId::Start.id()), Some(TagId::Start));
        assert_eq!(TagId::from_id(TagId::Unknown.id()), Some(TagId::Unknown));
        assert_eq!(TagId::from_id(0), None);
        assert_eq!(TagId::from_id(18), None);
    }
}

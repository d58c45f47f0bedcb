//! The fixed separator alphabet.
//!
//! Every codepoint the tokenizer sees is either a word character or one of
//! these separators; classification is a single call to
//! [`SeparatorKind::of_char`]. Each separator knows its id byte, canonical
//! character, whether it terminates a sentence and whether it may appear
//! inside a word (apostrophe in elisions, hyphen in compounds).

/// A separator codepoint class.
///
/// Separators are never merged: three consecutive dots produce three
/// `Point` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeparatorKind {
    Space,
    Newline,
    Tab,
    Point,
    Comma,
    Semicolon,
    Colon,
    Exclamation,
    Question,
    Apostrophe,
    Hyphen,
    Slash,
    Backslash,
    ParenOpen,
    ParenClose,
    Quote,
}

/// All separators, indexed by id byte.
const ALL: [SeparatorKind; 16] = [
    SeparatorKind::Space,
    SeparatorKind::Newline,
    SeparatorKind::Tab,
    SeparatorKind::Point,
    SeparatorKind::Comma,
    SeparatorKind::Semicolon,
    SeparatorKind::Colon,
    SeparatorKind::Exclamation,
    SeparatorKind::Question,
    SeparatorKind::Apostrophe,
    SeparatorKind::Hyphen,
    SeparatorKind::Slash,
    SeparatorKind::Backslash,
    SeparatorKind::ParenOpen,
    SeparatorKind::ParenClose,
    SeparatorKind::Quote,
];

impl SeparatorKind {
    /// Stable id byte used by the token stream codec.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Looks a separator up by its id byte.
    pub fn from_id(id: u8) -> Option<SeparatorKind> {
        ALL.get(id as usize).copied()
    }

    /// The canonical character, used when stitching word-internal separators
    /// back into a prefix string.
    pub fn as_char(self) -> char {
        match self {
            SeparatorKind::Space => ' ',
            SeparatorKind::Newline => '\n',
            SeparatorKind::Tab => '\t',
            SeparatorKind::Point => '.',
            SeparatorKind::Comma => ',',
            SeparatorKind::Semicolon => ';',
            SeparatorKind::Colon => ':',
            SeparatorKind::Exclamation => '!',
            SeparatorKind::Question => '?',
            SeparatorKind::Apostrophe => '\'',
            SeparatorKind::Hyphen => '-',
            SeparatorKind::Slash => '/',
            SeparatorKind::Backslash => '\\',
            SeparatorKind::ParenOpen => '(',
            SeparatorKind::ParenClose => ')',
            SeparatorKind::Quote => '"',
        }
    }

    /// Classifies a codepoint. The typographic apostrophe `’` maps to
    /// [`SeparatorKind::Apostrophe`]; every character not listed here is a
    /// word character.
    pub fn of_char(c: char) -> Option<SeparatorKind> {
        match c {
            ' ' | '\u{a0}' => Some(SeparatorKind::Space),
            '\n' | '\r' => Some(SeparatorKind::Newline),
            '\t' => Some(SeparatorKind::Tab),
            '.' => Some(SeparatorKind::Point),
            ',' => Some(SeparatorKind::Comma),
            ';' => Some(SeparatorKind::Semicolon),
            ':' => Some(SeparatorKind::Colon),
            '!' => Some(SeparatorKind::Exclamation),
            '?' => Some(SeparatorKind::Question),
            '\'' | '\u{2019}' => Some(SeparatorKind::Apostrophe),
            '-' => Some(SeparatorKind::Hyphen),
            '/' => Some(SeparatorKind::Slash),
            '\\' => Some(SeparatorKind::Backslash),
            '(' => Some(SeparatorKind::ParenOpen),
            ')' => Some(SeparatorKind::ParenClose),
            '"' | '\u{201c}' | '\u{201d}' | '\u{ab}' | '\u{bb}' => Some(SeparatorKind::Quote),
            _ => None,
        }
    }

    /// True for separators that end a sentence.
    pub fn is_sentence_separator(self) -> bool {
        matches!(
            self,
            SeparatorKind::Point
                | SeparatorKind::Exclamation
                | SeparatorKind::Question
                | SeparatorKind::Newline
        )
    }

    /// True for separators that may appear inside a word and therefore
    /// belong to a started prefix (`l'`, `peut-`).
    pub fn is_word_internal(self) -> bool {
        matches!(self, SeparatorKind::Apostrophe | SeparatorKind::Hyphen)
    }
}

//! Character-level tokenizer.
//!
//! Reads UTF-8 text line by line and emits a `Separator` token for every
//! separator codepoint and a `Word` token for every maximal run of word
//! characters in between. Separators are never merged and empty runs emit
//! nothing, so two adjacent separators yield exactly two separator tokens.
//!
//! The tokenizer is context-free: the emitted sequence is identical however
//! the input reader chunks its bytes.

use std::io::{BufRead, BufReader, Read};

use predictext_base::{Result, SeparatorKind, Token, TokenSource};

use crate::model::LanguageModel;

/// Streaming tokenizer over a byte reader.
pub struct Tokenizer<R: Read> {
    reader: BufReader<R>,
    line: String,
    pos: usize,
}

impl<R: Read> Tokenizer<R> {
    /// Wraps a reader. The language model's average word length sizes the
    /// internal line buffer.
    pub fn new(reader: R, model: &dyn LanguageModel) -> Self {
        Tokenizer {
            reader: BufReader::new(reader),
            line: String::with_capacity(model.average_word_length() * 16),
            pos: 0,
        }
    }

    /// Produces the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            if self.pos >= self.line.len() {
                self.line.clear();
                self.pos = 0;
                if self.reader.read_line(&mut self.line)? == 0 {
                    return Ok(None);
                }
            }

            let rest = &self.line[self.pos..];
            let first = rest.chars().next().expect("pos is on a char boundary");
            if let Some(sep) = SeparatorKind::of_char(first) {
                self.pos += first.len_utf8();
                return Ok(Some(Token::Separator(sep)));
            }

            // Maximal run of word characters.
            let end = rest
                .char_indices()
                .find(|&(_, c)| SeparatorKind::of_char(c).is_some())
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let word = rest[..end].to_string();
            self.pos += end;
            return Ok(Some(Token::Word(word)));
        }
    }

    /// Drains the input into a vector.
    pub fn read_all(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

impl<R: Read> TokenSource for Tokenizer<R> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        Tokenizer::next_token(self)
    }
}

/// Tokenizes an in-memory string.
pub fn tokenize_str(text: &str, model: &dyn LanguageModel) -> Result<Vec<Token>> {
    Tokenizer::new(text.as_bytes(), model).read_all()
}

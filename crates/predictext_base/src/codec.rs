//! Binary token stream codec.
//!
//! Intermediate training artifacts store tokens as `[type:u8][payload]`
//! records:
//!
//! ```text
//! 0 = Word         [len:u32][utf8 bytes]
//! 1 = Equivalence  [class:u8][len:u32][utf8 bytes]
//! 2 = Separator    [separator:u8]
//! 3 = Tag          [tag:u8]
//! ```
//!
//! All integers are little-endian. End of the underlying stream at a record
//! boundary is the end-of-stream sentinel; end of stream inside a record is
//! a decode error, as is any unknown type or id byte.

use std::io::{self, Read, Write};

use crate::equivalence::EquivalenceClassId;
use crate::error::{PredictError, Result};
use crate::separator::SeparatorKind;
use crate::tag::TagId;
use crate::token::Token;

const TYPE_WORD: u8 = 0;
const TYPE_EQUIVALENCE: u8 = 1;
const TYPE_SEPARATOR: u8 = 2;
const TYPE_TAG: u8 = 3;

/// A pulling producer of tokens.
///
/// Implemented by the tokenizer, the pattern converter and [`TokenReader`],
/// so pipeline stages compose regardless of whether tokens come from raw
/// text or from an intermediate artifact.
pub trait TokenSource {
    /// Produces the next token, or `None` when the source is exhausted.
    fn next_token(&mut self) -> Result<Option<Token>>;
}

impl<R: Read> TokenSource for TokenReader<R> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        self.read_token()
    }
}

impl TokenSource for std::vec::IntoIter<Token> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        Ok(self.next())
    }
}

/// Writes tokens to an underlying byte sink.
pub struct TokenWriter<W: Write> {
    inner: W,
}

impl<W: Write> TokenWriter<W> {
    pub fn new(inner: W) -> Self {
        TokenWriter { inner }
    }

    /// Appends one token record.
    pub fn write_token(&mut self, token: &Token) -> Result<()> {
        match token {
            Token::Word(text) => {
                self.inner.write_all(&[TYPE_WORD])?;
                write_text(&mut self.inner, text)?;
            }
            Token::Equivalence(class, text) => {
                self.inner.write_all(&[TYPE_EQUIVALENCE, class.id()])?;
                write_text(&mut self.inner, text)?;
            }
            Token::Separator(sep) => {
                self.inner.write_all(&[TYPE_SEPARATOR, sep.id()])?;
            }
            Token::Tag(tag) => {
                self.inner.write_all(&[TYPE_TAG, tag.id()])?;
            }
        }
        Ok(())
    }

    /// Flushes and returns the underlying sink.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads tokens from an underlying byte source.
pub struct TokenReader<R: Read> {
    inner: R,
}

impl<R: Read> TokenReader<R> {
    pub fn new(inner: R) -> Self {
        TokenReader { inner }
    }

    /// Reads the next token, or `None` at end of stream.
    pub fn read_token(&mut self) -> Result<Option<Token>> {
        let type_byte = match read_byte_or_eof(&mut self.inner)? {
            Some(b) => b,
            None => return Ok(None),
        };
        match type_byte {
            TYPE_WORD => Ok(Some(Token::Word(read_text(&mut self.inner)?))),
            TYPE_EQUIVALENCE => {
                let class_id = read_byte(&mut self.inner)?;
                let class = EquivalenceClassId::from_id(class_id).ok_or_else(|| {
                    PredictError::Decode(format!("unknown equivalence class id {}", class_id))
                })?;
                Ok(Some(Token::Equivalence(class, read_text(&mut self.inner)?)))
            }
            TYPE_SEPARATOR => {
                let sep_id = read_byte(&mut self.inner)?;
                let sep = SeparatorKind::from_id(sep_id).ok_or_else(|| {
                    PredictError::Decode(format!("unknown separator id {}", sep_id))
                })?;
                Ok(Some(Token::Separator(sep)))
            }
            TYPE_TAG => {
                let tag_id = read_byte(&mut self.inner)?;
                let tag = TagId::from_id(tag_id).ok_or_else(|| {
                    PredictError::Decode(format!("unknown tag id {}", tag_id))
                })?;
                Ok(Some(Token::Tag(tag)))
            }
            other => Err(PredictError::Decode(format!(
                "unknown token type byte {}",
                other
            ))),
        }
    }

    /// Drains the stream into a vector.
    pub fn read_all(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.read_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

fn write_text<W: Write>(w: &mut W, text: &str) -> Result<()> {
    let bytes = text.as_bytes();
    w.write_all(&(bytes.len() as u32).to_le_bytes())?;
    w.write_all(bytes)?;
    Ok(())
}

fn read_text<R: Read>(r: &mut R) -> Result<String> {
    let mut len_buf = [0u8; 4];
    read_exact_record(r, &mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut bytes = vec![0u8; len];
    read_exact_record(r, &mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|e| PredictError::Decode(format!("invalid utf-8 in token text: {}", e)))
}

fn read_byte<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact_record(r, &mut buf)?;
    Ok(buf[0])
}

/// Reads one byte, treating immediate EOF as the stream sentinel.
fn read_byte_or_eof<R: Read>(r: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match r.read(&mut buf)? {
        0 => Ok(None),
        _ => Ok(Some(buf[0])),
    }
}

/// Like `read_exact` but reports truncation as a decode error: EOF is only
/// legal before the type byte.
fn read_exact_record<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            PredictError::Decode("truncated token record".into())
        } else {
            PredictError::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(tokens: &[Token]) -> Vec<Token> {
        let mut writer = TokenWriter::new(Vec::new());
        for t in tokens {
            writer.write_token(t).unwrap();
        }
        let bytes = writer.finish().unwrap();
        TokenReader::new(&bytes[..]).read_all().unwrap()
    }

    #[test]
    fn mixed_stream_round_trips() {
        let tokens = vec![
            Token::word("le"),
            Token::Separator(SeparatorKind::Space),
            Token::word("chien"),
            Token::Equivalence(EquivalenceClassId::Integer, "42".into()),
            Token::Separator(SeparatorKind::Point),
            Token::Tag(TagId::Start),
        ];
        assert_eq!(round_trip(&tokens), tokens);
    }

    #[test]
    fn accented_text_survives() {
        let tokens = vec![Token::word("était"), Token::word("où")];
        assert_eq!(round_trip(&tokens), tokens);
    }

    #[test]
    fn empty_stream_yields_no_tokens() {
        let mut reader = TokenReader::new(&[][..]);
        assert!(reader.read_token().unwrap().is_none());
    }

    #[test]
    fn unknown_type_byte_is_a_decode_error() {
        let bytes = [99u8];
        let err = TokenReader::new(&bytes[..]).read_token().unwrap_err();
        assert!(matches!(err, PredictError::Decode(_)));
    }

    #[test]
    fn truncated_word_record_is_a_decode_error() {
        let mut writer = TokenWriter::new(Vec::new());
        writer.write_token(&Token::word("chien")).unwrap();
        let bytes = writer.finish().unwrap();
        let err = TokenReader::new(&bytes[..bytes.len() - 2])
            .read_all()
            .unwrap_err();
        assert!(matches!(err, PredictError::Decode(_)));
    }

    #[test]
    fn unknown_separator_id_is_a_decode_error() {
        let bytes = [TYPE_SEPARATOR, 200];
        let err = TokenReader::new(&bytes[..]).read_token().unwrap_err();
        assert!(matches!(err, PredictError::Decode(_)));
    }
}

//! Gzip word stream codec.
//!
//! Dictionary files are a gzip member containing one record per word:
//!
//! ```text
//! [type:u8][id:i32]
//!   type 0 = Simple  [len:u32][utf8][probFactor:f64][mbu][mbs][fi][fv]
//!   type 1 = User    Simple body + [count:i32][lastUseEpochMillis:i64]
//!   type 2 = Equivalence [class:u8]
//!   type 3 = Tag         [tag:u8]
//! ```
//!
//! Flags are single bytes (0/1), integers little-endian. End of the gzip
//! stream at a record boundary ends the dictionary; anything else is a
//! decode error.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use predictext_base::{EquivalenceClassId, PredictError, Result, TagId, WordId};

use crate::word::{SimpleWord, UserWord, Word};

const TYPE_SIMPLE: u8 = 0;
const TYPE_USER: u8 = 1;
const TYPE_EQUIVALENCE: u8 = 2;
const TYPE_TAG: u8 = 3;

/// Writes words to a gzip file at `path`.
pub fn write_words_file<'a>(
    path: &Path,
    words: impl Iterator<Item = &'a Word>,
) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = GzEncoder::new(file, Compression::default());
    for word in words {
        write_word(&mut encoder, word)?;
    }
    encoder.finish()?.flush()?;
    Ok(())
}

/// Reads every word from a gzip stream.
pub fn read_words(reader: impl Read) -> Result<Vec<Word>> {
    let mut decoder = GzDecoder::new(reader);
    let mut words = Vec::new();
    while let Some(word) = read_word(&mut decoder)? {
        words.push(word);
    }
    Ok(words)
}

fn write_word<W: Write>(w: &mut W, word: &Word) -> Result<()> {
    match word {
        Word::Simple(s) => {
            w.write_all(&[TYPE_SIMPLE])?;
            w.write_all(&s.id.to_le_bytes())?;
            write_simple_body(w, s)?;
        }
        Word::User(u) => {
            w.write_all(&[TYPE_USER])?;
            w.write_all(&u.word.id.to_le_bytes())?;
            write_simple_body(w, &u.word)?;
            w.write_all(&u.usage_count.to_le_bytes())?;
            w.write_all(&u.last_use_epoch_millis.to_le_bytes())?;
        }
        Word::Equivalence(class) => {
            w.write_all(&[TYPE_EQUIVALENCE])?;
            w.write_all(&class.word_id().to_le_bytes())?;
            w.write_all(&[class.id()])?;
        }
        Word::Tag(tag) => {
            w.write_all(&[TYPE_TAG])?;
            w.write_all(&tag.word_id().to_le_bytes())?;
            w.write_all(&[tag.id()])?;
        }
    }
    Ok(())
}

fn write_simple_body<W: Write>(w: &mut W, s: &SimpleWord) -> Result<()> {
    let bytes = s.text.as_bytes();
    w.write_all(&(bytes.len() as u32).to_le_bytes())?;
    w.write_all(bytes)?;
    w.write_all(&s.prob_factor.to_le_bytes())?;
    w.write_all(&[
        s.modified_by_user as u8,
        s.modified_by_system as u8,
        s.force_invalid as u8,
        s.force_valid as u8,
    ])?;
    Ok(())
}

fn read_word<R: Read>(r: &mut R) -> Result<Option<Word>> {
    let type_byte = match read_byte_or_eof(r)? {
        Some(b) => b,
        None => return Ok(None),
    };
    let id = read_i32(r)?;
    match type_byte {
        TYPE_SIMPLE => Ok(Some(Word::Simple(read_simple_body(r, id)?))),
        TYPE_USER => {
            let word = read_simple_body(r, id)?;
            let usage_count = read_i32(r)?;
            let last_use_epoch_millis = read_i64(r)?;
            Ok(Some(Word::User(UserWord {
                word,
                usage_count,
                last_use_epoch_millis,
            })))
        }
        TYPE_EQUIVALENCE => {
            let class_id = read_byte(r)?;
            let class = EquivalenceClassId::from_id(class_id).ok_or_else(|| {
                PredictError::Decode(format!("unknown equivalence class id {}", class_id))
            })?;
            Ok(Some(Word::Equivalence(class)))
        }
        TYPE_TAG => {
            let tag_id = read_byte(r)?;
            let tag = TagId::from_id(tag_id)
                .ok_or_else(|| PredictError::Decode(format!("unknown tag id {}", tag_id)))?;
            Ok(Some(Word::Tag(tag)))
        }
        other => Err(PredictError::Decode(format!(
            "unknown word type byte {}",
            other
        ))),
    }
}

fn read_simple_body<R: Read>(r: &mut R, id: WordId) -> Result<SimpleWord> {
    let len = read_i32(r)? as usize;
    let mut bytes = vec![0u8; len];
    read_exact_record(r, &mut bytes)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| PredictError::Decode(format!("invalid utf-8 in word text: {}", e)))?;
    let mut factor = [0u8; 8];
    read_exact_record(r, &mut factor)?;
    let mut flags = [0u8; 4];
    read_exact_record(r, &mut flags)?;
    Ok(SimpleWord {
        id,
        text,
        modified_by_user: flags[0] != 0,
        modified_by_system: flags[1] != 0,
        prob_factor: f64::from_le_bytes(factor),
        force_invalid: flags[2] != 0,
        force_valid: flags[3] != 0,
    })
}

fn read_byte<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact_record(r, &mut buf)?;
    Ok(buf[0])
}

fn read_byte_or_eof<R: Read>(r: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match r.read(&mut buf)? {
        0 => Ok(None),
        _ => Ok(Some(buf[0])),
    }
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    read_exact_record(r, &mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i64<R: Read>(r: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    read_exact_record(r, &mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_exact_record<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            PredictError::Decode("truncated word record".into())
        } else {
            PredictError::Io(e)
        }
    })
}

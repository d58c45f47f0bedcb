//! Stage 3: the word dictionary and the clean token streams.
//!
//! One counting pass over every converted artifact feeds the case policy;
//! the resulting resolution map then rewrites each document with resolved
//! surfaces (unresolvable words become UNKNOWN tags), so the n-gram stage
//! reads streams whose every word is in the vocabulary or explicitly
//! unknown.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rustc_hash::FxHashMap;

use predictext_base::{Result, TagId, Token, TokenReader, TokenWriter};
use predictext_lexicon::{BaseWordDictionary, CasePolicy, WordDictionary, WordDictionaryBuilder};

/// Counts the word surfaces of one converted artifact.
pub fn count(converted: &Path) -> Result<WordDictionaryBuilder> {
    let mut reader = TokenReader::new(BufReader::new(File::open(converted)?));
    let mut builder = WordDictionaryBuilder::new();
    while let Some(token) = reader.read_token()? {
        builder.count_token(&token);
    }
    Ok(builder)
}

/// Applies the case policy to the merged counts.
pub fn build_dictionary(
    builder: WordDictionaryBuilder,
    policy: &CasePolicy,
    base: Option<&BaseWordDictionary>,
) -> (WordDictionary, FxHashMap<String, Option<String>>) {
    builder.build(policy, base)
}

/// Rewrites one document with resolved surfaces.
pub fn rewrite(
    converted: &Path,
    artifact: &Path,
    resolution: &FxHashMap<String, Option<String>>,
) -> Result<()> {
    let mut reader = TokenReader::new(BufReader::new(File::open(converted)?));
    let mut writer = TokenWriter::new(BufWriter::new(File::create(artifact)?));
    while let Some(token) = reader.read_token()? {
        let resolved = match &token {
            Token::Word(text) => match resolution.get(text.as_str()) {
                Some(Some(form)) => Token::Word(form.clone()),
                _ => Token::Tag(TagId::Unknown),
            },
            other => other.clone(),
        };
        writer.write_token(&resolved)?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{convert, parse};
    use predictext_language::FrenchModel;

    #[test]
    fn counting_building_and_rewriting_chain() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.txt");
        let raw = dir.path().join("doc.tok");
        let converted = dir.path().join("doc.ctok");
        let clean = dir.path().join("doc.clean");
        std::fs::write(&input, "le chien mange. le chien dort. xyzzy dort.").unwrap();

        let model = FrenchModel::new();
        parse::run(&input, &raw, &model).unwrap();
        convert::run(&raw, &converted, &model).unwrap();

        let builder = count(&converted).unwrap();
        assert_eq!(builder.surface_count("chien"), 2);

        let policy = CasePolicy {
            directly_valid_word_count_threshold: 2,
            ..CasePolicy::default()
        };
        let (dict, resolution) = build_dictionary(builder, &policy, None);
        assert!(dict.get_word("chien").is_some());
        assert!(dict.get_word("xyzzy").is_none());

        rewrite(&converted, &clean, &resolution).unwrap();
        let tokens = TokenReader::new(BufReader::new(File::open(&clean).unwrap()))
            .read_all()
            .unwrap();
        assert!(tokens.contains(&Token::word("chien")));
        assert!(tokens.contains(&Token::Tag(TagId::Unknown)));
        assert!(!tokens.iter().any(|t| t.text() == Some("xyzzy")));
    }
}

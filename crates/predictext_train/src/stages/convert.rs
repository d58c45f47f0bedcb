//! Stage 2: fold n-gram patterns in one document's token stream.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use predictext_base::{Result, TokenReader, TokenWriter};
use predictext_language::{LanguageModel, TokenConverter};

/// Applies the n-gram matcher preset to a raw token artifact.
pub fn run(raw: &Path, artifact: &Path, model: &dyn LanguageModel) -> Result<()> {
    let reader = TokenReader::new(BufReader::new(File::open(raw)?));
    let mut converter = TokenConverter::new(reader, model.ngram_matchers());
    let mut writer = TokenWriter::new(BufWriter::new(File::create(artifact)?));
    while let Some(token) = converter.next_token()? {
        writer.write_token(&token)?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::parse;
    use predictext_base::{EquivalenceClassId, Token, TokenReader};
    use predictext_language::FrenchModel;

    #[test]
    fn numbers_fold_between_stages() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.txt");
        let raw = dir.path().join("doc.tok");
        let converted = dir.path().join("doc.ctok");
        std::fs::write(&input, "il a 42 ans").unwrap();

        let model = FrenchModel::new();
        parse::run(&input, &raw, &model).unwrap();
        run(&raw, &converted, &model).unwrap();

        let tokens = TokenReader::new(BufReader::new(File::open(&converted).unwrap()))
            .read_all()
            .unwrap();
        assert!(tokens.contains(&Token::Equivalence(EquivalenceClassId::Integer, "42".into())));
    }
}

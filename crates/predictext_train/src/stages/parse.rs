//! Stage 1: tokenize one document into a raw token artifact.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use predictext_base::{Result, TokenWriter};
use predictext_language::{LanguageModel, Tokenizer};

/// Tokenizes `input` and writes the token stream to `artifact`.
pub fn run(input: &Path, artifact: &Path, model: &dyn LanguageModel) -> Result<()> {
    let mut tokenizer = Tokenizer::new(File::open(input)?, model);
    let mut writer = TokenWriter::new(BufWriter::new(File::create(artifact)?));
    while let Some(token) = tokenizer.next_token()? {
        writer.write_token(&token)?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use predictext_base::{Token, TokenReader};
    use predictext_language::FrenchModel;
    use std::io::BufReader;

    #[test]
    fn artifact_round_trips_the_token_stream() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.txt");
        let artifact = dir.path().join("doc.tok");
        std::fs::write(&input, "le chien.").unwrap();

        run(&input, &artifact, &FrenchModel::new()).unwrap();

        let tokens = TokenReader::new(BufReader::new(File::open(&artifact).unwrap()))
            .read_all()
            .unwrap();
        assert_eq!(tokens.iter().filter(|t| t.is_word()).count(), 2);
        assert_eq!(tokens.first(), Some(&Token::word("le")));
    }
}

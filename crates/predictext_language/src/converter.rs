//! The pattern converter.
//!
//! Pulls tokens from any [`TokenSource`], keeps a lookahead window, and on
//! each position tries the configured matchers in priority order. A match
//! replaces its span with the matcher's output token; anything else passes
//! through unchanged. The converter is itself a `TokenSource`, so stages
//! chain: tokenizer → converter → writer.

use std::collections::VecDeque;

use predictext_base::{Result, Token, TokenSource};

use crate::matcher::PatternMatcher;

/// Lookahead window size; bounds the span of greedy matchers.
const LOOKAHEAD: usize = 32;

/// Priority-ordered pattern folding over a token source.
pub struct TokenConverter<S: TokenSource> {
    source: S,
    matchers: Vec<PatternMatcher>,
    window: VecDeque<Token>,
    source_done: bool,
}

impl<S: TokenSource> TokenConverter<S> {
    pub fn new(source: S, matchers: Vec<PatternMatcher>) -> Self {
        TokenConverter {
            source,
            matchers,
            window: VecDeque::with_capacity(LOOKAHEAD),
            source_done: false,
        }
    }

    /// Produces the next (possibly folded) token.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.fill_window()?;
        if self.window.is_empty() {
            return Ok(None);
        }

        let slice = self.window.make_contiguous();
        for matcher in &self.matchers {
            if let Some(m) = matcher.try_match(slice) {
                debug_assert!(m.consumed >= 1 && m.consumed <= slice.len());
                self.window.drain(..m.consumed);
                return Ok(Some(m.output));
            }
        }
        Ok(self.window.pop_front())
    }

    /// Drains the source into a vector.
    pub fn read_all(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn fill_window(&mut self) -> Result<()> {
        while !self.source_done && self.window.len() < LOOKAHEAD {
            match self.source.next_token()? {
                Some(token) => self.window.push_back(token),
                None => self.source_done = true,
            }
        }
        Ok(())
    }
}

impl<S: TokenSource> TokenSource for TokenConverter<S> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        TokenConverter::next_token(self)
    }
}

/// Converts an in-memory token list.
pub fn convert_tokens(tokens: Vec<Token>, matchers: Vec<PatternMatcher>) -> Result<Vec<Token>> {
    TokenConverter::new(tokens.into_iter(), matchers).read_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FrenchModel, LanguageModel};
    use crate::tokenizer::tokenize_str;
    use predictext_base::{EquivalenceClassId, SeparatorKind, Token};

    fn convert(text: &str, ngram: bool) -> Vec<Token> {
        let model = FrenchModel::new();
        let tokens = tokenize_str(text, &model).unwrap();
        let matchers = if ngram {
            model.ngram_matchers()
        } else {
            model.semantic_matchers()
        };
        convert_tokens(tokens, matchers).unwrap()
    }

    #[test]
    fn non_matching_tokens_pass_through() {
        assert_eq!(
            convert("le chien", true),
            vec![
                Token::word("le"),
                Token::Separator(SeparatorKind::Space),
                Token::word("chien"),
            ]
        );
    }

    #[test]
    fn date_folds_to_one_token_in_semantic_preset() {
        let out = convert("le 12/06/2024 au matin", false);
        assert!(out.contains(&Token::Equivalence(
            EquivalenceClassId::DateFullDigit,
            "12/06/2024".into()
        )));
        // five raw tokens folded into one
        assert_eq!(out.iter().filter(|t| t.is_word()).count(), 3);
    }

    #[test]
    fn ngram_preset_does_not_fold_dates() {
        let out = convert("12/06/2024", true);
        // slashes split it into numbers; the integers still fold
        assert!(out
            .iter()
            .all(|t| !matches!(t, Token::Equivalence(EquivalenceClassId::DateFullDigit, _))));
    }

    #[test]
    fn elision_and_following_word_both_survive() {
        assert_eq!(
            convert("l'ami", true),
            vec![Token::word("l'"), Token::word("ami")]
        );
    }

    #[test]
    fn special_word_wins_over_elision() {
        assert_eq!(convert("aujourd'hui", true), vec![Token::word("aujourd'hui")]);
    }

    #[test]
    fn acronym_folds_in_both_presets() {
        for ngram in [false, true] {
            let out = convert("la S.N.C.F. recrute", ngram);
            assert!(out.contains(&Token::Equivalence(
                EquivalenceClassId::Acronym,
                "SNCF".into()
            )));
        }
    }

    #[test]
    fn hyphen_compound_folds() {
        let out = convert("il va peut-être venir", true);
        assert!(out.contains(&Token::word("peut-être")));
    }

    #[test]
    fn priority_prefers_decimal_over_integer() {
        let out = convert("3,14", true);
        assert_eq!(
            out,
            vec![Token::Equivalence(EquivalenceClassId::Decimal, "3,14".into())]
        );
    }

    #[test]
    fn sentence_punctuation_is_kept() {
        let out = convert("le chien mange.", true);
        assert_eq!(out.last(), Some(&Token::Separator(SeparatorKind::Point)));
    }

    #[test]
    fn proper_name_folds_only_in_semantic_preset() {
        let folded = convert("Jean Dupont arrive", false);
        assert!(folded.contains(&Token::Equivalence(
            EquivalenceClassId::ProperName,
            "Jean Dupont".into()
        )));
        let raw = convert("Jean Dupont arrive", true);
        assert!(raw.contains(&Token::word("Jean")));
        assert!(raw.contains(&Token::word("Dupont")));
    }
}

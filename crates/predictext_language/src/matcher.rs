//! Multi-token pattern matchers.
//!
//! Each matcher inspects the front of a token window and, on a whole match,
//! folds the matched span into a single output token. Matchers are tried in
//! a fixed priority order by the [`TokenConverter`](crate::TokenConverter);
//! the first whole match wins and consumes exactly its matched tokens.
//!
//! ## Priority order (semantic preset)
//!
//! 1. full digit date (`12/06/2024`)        → `DATE_FULL_DIGIT`
//! 2. day month-name year (`12 juin 2024`)  → `DATE_FULL_TEXT`
//! 3. month-name year (`juin 2024`)         → `DATE_MONTH_YEAR`
//! 4. day month-name (`12 juin`)            → `DATE_DAY_MONTH`
//! 5. percent (`50 %`, `3,14%`)             → `PERCENT`
//! 6. apostrophe compound (`aujourd'hui`)   → single word
//! 7. weekday name (`lundi`)                → `DATE_WEEK_DAY`
//! 8. decimal number (`3,14`)               → `DECIMAL`
//! 9. integer (`42`)                        → `INTEGER`
//! 10. elision (`l'`)                       → single word
//! 11. acronym (`S.N.C.F.`)                 → `ACRONYM`
//! 12. proper name (`Jean Dupont`)          → `PROPER_NAME`
//! 13. hyphen compound (`peut-être`)        → single word
//!
//! The n-gram preset keeps only 5, 6, 8, 9, 10, 11, 13.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use predictext_base::{EquivalenceClassId, SeparatorKind, Token};

use crate::model::LanguageModel;

/// Result of a successful match: how many input tokens were consumed and
/// the single token replacing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub consumed: usize,
    pub output: Token,
}

/// A multi-token pattern recognizer.
#[derive(Debug, Clone)]
pub enum PatternMatcher {
    DateFullDigit { pivot_year: i32 },
    DateFullText { months: Vec<String> },
    DateMonthYear { months: Vec<String> },
    DateDayMonth { months: Vec<String> },
    Percent,
    SpecialWord { words: HashSet<String> },
    DateWeekDay { weekdays: Vec<String> },
    NumberDecimal,
    NumberInt,
    Apostrophe,
    Acronym,
    ProperName { stop_words: HashSet<String> },
    Hyphen,
}

impl PatternMatcher {
    /// The full matcher list for a language, in priority order.
    pub fn semantic_preset(model: &dyn LanguageModel) -> Vec<PatternMatcher> {
        let months = model.month_names().to_vec();
        vec![
            PatternMatcher::DateFullDigit {
                pivot_year: current_year(),
            },
            PatternMatcher::DateFullText {
                months: months.clone(),
            },
            PatternMatcher::DateMonthYear {
                months: months.clone(),
            },
            PatternMatcher::DateDayMonth { months },
            PatternMatcher::Percent,
            PatternMatcher::SpecialWord {
                words: model.special_words().clone(),
            },
            PatternMatcher::DateWeekDay {
                weekdays: model.weekday_names().to_vec(),
            },
            PatternMatcher::NumberDecimal,
            PatternMatcher::NumberInt,
            PatternMatcher::Apostrophe,
            PatternMatcher::Acronym,
            PatternMatcher::ProperName {
                stop_words: model.stop_words().clone(),
            },
            PatternMatcher::Hyphen,
        ]
    }

    /// The subset folded before n-gram counting and prediction, in priority
    /// order.
    pub fn ngram_preset(model: &dyn LanguageModel) -> Vec<PatternMatcher> {
        vec![
            PatternMatcher::Percent,
            PatternMatcher::SpecialWord {
                words: model.special_words().clone(),
            },
            PatternMatcher::NumberDecimal,
            PatternMatcher::NumberInt,
            PatternMatcher::Apostrophe,
            PatternMatcher::Acronym,
            PatternMatcher::Hyphen,
        ]
    }

    /// Tries to match the front of `window`.
    pub fn try_match(&self, window: &[Token]) -> Option<PatternMatch> {
        match self {
            PatternMatcher::DateFullDigit { pivot_year } => date_full_digit(window, *pivot_year),
            PatternMatcher::DateFullText { months } => date_full_text(window, months),
            PatternMatcher::DateMonthYear { months } => date_month_year(window, months),
            PatternMatcher::DateDayMonth { months } => date_day_month(window, months),
            PatternMatcher::Percent => percent(window),
            PatternMatcher::SpecialWord { words } => special_word(window, words),
            PatternMatcher::DateWeekDay { weekdays } => date_week_day(window, weekdays),
            PatternMatcher::NumberDecimal => number_decimal(window),
            PatternMatcher::NumberInt => number_int(window),
            PatternMatcher::Apostrophe => apostrophe(window),
            PatternMatcher::Acronym => acronym(window),
            PatternMatcher::ProperName { stop_words } => proper_name(window, stop_words),
            PatternMatcher::Hyphen => hyphen(window),
        }
    }
}

// ============================================================================
// Individual patterns
// ============================================================================

fn date_full_digit(w: &[Token], pivot: i32) -> Option<PatternMatch> {
    let day = parse_digits(word(w, 0)?, 1, 2).filter(|&d| d <= 39)?;
    let s1 = sep(w, 1)?;
    if !is_date_separator(s1) {
        return None;
    }
    let month = parse_digits(word(w, 2)?, 1, 2).filter(|&m| m <= 19)?;
    if sep(w, 3)? != s1 {
        return None;
    }
    let year_text = word(w, 4)?;
    let year = match year_text.len() {
        2 | 4 => parse_digits(year_text, 2, 4)?,
        _ => return None,
    };
    let year = expand_year(year as i32, pivot);
    Some(PatternMatch {
        consumed: 5,
        output: Token::Equivalence(
            EquivalenceClassId::DateFullDigit,
            format!("{:02}/{:02}/{}", day, month, year),
        ),
    })
}

fn date_full_text(w: &[Token], months: &[String]) -> Option<PatternMatch> {
    let day = word(w, 0)?;
    parse_digits(day, 1, 2).filter(|&d| (1..=31).contains(&d))?;
    space(w, 1)?;
    let month = word(w, 2).filter(|m| is_month(m, months))?;
    space(w, 3)?;
    let year = word(w, 4)?;
    parse_digits(year, 2, 4)?;
    Some(PatternMatch {
        consumed: 5,
        output: Token::Equivalence(
            EquivalenceClassId::DateFullText,
            format!("{} {} {}", day, month, year),
        ),
    })
}

fn date_month_year(w: &[Token], months: &[String]) -> Option<PatternMatch> {
    let month = word(w, 0).filter(|m| is_month(m, months))?;
    space(w, 1)?;
    let year = word(w, 2)?;
    parse_digits(year, 2, 4)?;
    Some(PatternMatch {
        consumed: 3,
        output: Token::Equivalence(
            EquivalenceClassId::DateMonthYear,
            format!("{} {}", month, year),
        ),
    })
}

fn date_day_month(w: &[Token], months: &[String]) -> Option<PatternMatch> {
    let day = word(w, 0)?;
    parse_digits(day, 1, 2).filter(|&d| (1..=31).contains(&d))?;
    space(w, 1)?;
    let month = word(w, 2).filter(|m| is_month(m, months))?;
    Some(PatternMatch {
        consumed: 3,
        output: Token::Equivalence(
            EquivalenceClassId::DateDayMonth,
            format!("{} {}", day, month),
        ),
    })
}

/// Number (integer or decimal) followed by `%`, with or without a space.
/// The percent sign is a word character, so `50%` arrives as one token and
/// `50 %` as three.
fn percent(w: &[Token]) -> Option<PatternMatch> {
    // decimal, then a space and a bare percent sign: `3,14 %`
    if let Some((text, _)) = decimal_parts(w) {
        if space(w, 3).is_some() && word(w, 4) == Some("%") {
            return Some(percent_match(5, format!("{}%", text)));
        }
        // decimal whose fractional token carries the sign: `3,14%`
    }
    if let (Some(int), Some(s), Some(frac)) = (word(w, 0), sep(w, 1), word(w, 2)) {
        if is_decimal_separator(s) && digits(int) {
            if let Some(stripped) = frac.strip_suffix('%') {
                if digits(stripped) && !stripped.is_empty() {
                    return Some(percent_match(
                        3,
                        format!("{}{}{}%", int, s.as_char(), stripped),
                    ));
                }
            }
        }
    }
    // integer and a separate percent sign: `50 %`
    if let Some(int) = word(w, 0).filter(|t| digits(t)) {
        if space(w, 1).is_some() && word(w, 2) == Some("%") {
            return Some(percent_match(3, format!("{}%", int)));
        }
    }
    // single token: `50%`
    if let Some(text) = word(w, 0) {
        if let Some(stripped) = text.strip_suffix('%') {
            if digits(stripped) && !stripped.is_empty() {
                return Some(percent_match(1, text.to_string()));
            }
        }
    }
    None
}

fn percent_match(consumed: usize, text: String) -> PatternMatch {
    PatternMatch {
        consumed,
        output: Token::Equivalence(EquivalenceClassId::Percent, text),
    }
}

fn special_word(w: &[Token], words: &HashSet<String>) -> Option<PatternMatch> {
    let left = word(w, 0)?;
    if sep(w, 1)? != SeparatorKind::Apostrophe {
        return None;
    }
    let right = word(w, 2)?;
    let surface = format!("{}'{}", left, right);
    if !words.contains(&surface.to_lowercase()) {
        return None;
    }
    Some(PatternMatch {
        consumed: 3,
        output: Token::Word(surface),
    })
}

fn date_week_day(w: &[Token], weekdays: &[String]) -> Option<PatternMatch> {
    let text = word(w, 0)?;
    let lower = text.to_lowercase();
    if !weekdays.iter().any(|d| *d == lower) {
        return None;
    }
    Some(PatternMatch {
        consumed: 1,
        output: Token::Equivalence(EquivalenceClassId::DateWeekDay, lower),
    })
}

fn number_decimal(w: &[Token]) -> Option<PatternMatch> {
    let (text, _) = decimal_parts(w)?;
    Some(PatternMatch {
        consumed: 3,
        output: Token::Equivalence(EquivalenceClassId::Decimal, text),
    })
}

fn number_int(w: &[Token]) -> Option<PatternMatch> {
    let text = word(w, 0).filter(|t| digits(t))?;
    Some(PatternMatch {
        consumed: 1,
        output: Token::Equivalence(EquivalenceClassId::Integer, text.to_string()),
    })
}

/// Letters followed by an apostrophe: the French elisions `l'`, `d'`, `qu'`.
/// The apostrophe stays attached so the following word stands alone.
fn apostrophe(w: &[Token]) -> Option<PatternMatch> {
    let text = word(w, 0).filter(|t| letters(t))?;
    if sep(w, 1)? != SeparatorKind::Apostrophe {
        return None;
    }
    Some(PatternMatch {
        consumed: 2,
        output: Token::Word(format!("{}'", text)),
    })
}

/// Alternating single uppercase letters and points, at least two letters.
/// A trailing point is consumed when present (`S.N.C.F.`).
fn acronym(w: &[Token]) -> Option<PatternMatch> {
    let mut letters_acc = String::new();
    let first = word(w, 0).filter(|t| upper_single(t))?;
    letters_acc.push_str(first);
    let mut consumed = 1;
    while sep(w, consumed) == Some(SeparatorKind::Point) {
        match word(w, consumed + 1).filter(|t| upper_single(t)) {
            Some(next) => {
                letters_acc.push_str(next);
                consumed += 2;
            }
            None => {
                // trailing point closes the acronym
                consumed += 1;
                break;
            }
        }
    }
    if letters_acc.chars().count() < 2 {
        return None;
    }
    Some(PatternMatch {
        consumed,
        output: Token::Equivalence(EquivalenceClassId::Acronym, letters_acc),
    })
}

/// Two to four consecutive capitalized words joined by single spaces.
fn proper_name(w: &[Token], stop_words: &HashSet<String>) -> Option<PatternMatch> {
    let is_name_part = |t: &str| capitalized(t) && !stop_words.contains(&t.to_lowercase());

    let mut parts = vec![word(w, 0).filter(|t| is_name_part(t))?];
    let mut consumed = 1;
    while parts.len() < 4 {
        if space(w, consumed).is_none() {
            break;
        }
        match word(w, consumed + 1).filter(|t| is_name_part(t)) {
            Some(next) => {
                parts.push(next);
                consumed += 2;
            }
            None => break,
        }
    }
    if parts.len() < 2 {
        return None;
    }
    Some(PatternMatch {
        consumed,
        output: Token::Equivalence(EquivalenceClassId::ProperName, parts.join(" ")),
    })
}

/// Letter runs joined by hyphens, greedily: `peut-être`, `va-t-il`.
fn hyphen(w: &[Token]) -> Option<PatternMatch> {
    let mut parts = vec![word(w, 0).filter(|t| letters(t))?];
    let mut consumed = 1;
    while sep(w, consumed) == Some(SeparatorKind::Hyphen) {
        match word(w, consumed + 1).filter(|t| letters(t)) {
            Some(next) => {
                parts.push(next);
                consumed += 2;
            }
            None => break,
        }
    }
    if parts.len() < 2 {
        return None;
    }
    Some(PatternMatch {
        consumed,
        output: Token::Word(parts.join("-")),
    })
}

// ============================================================================
// Token and text helpers
// ============================================================================

fn is_month(text: &str, months: &[String]) -> bool {
    let lower = text.to_lowercase();
    months.iter().any(|m| *m == lower)
}

fn word(w: &[Token], i: usize) -> Option<&str> {
    match w.get(i) {
        Some(Token::Word(t)) => Some(t),
        _ => None,
    }
}

fn sep(w: &[Token], i: usize) -> Option<SeparatorKind> {
    match w.get(i) {
        Some(Token::Separator(s)) => Some(*s),
        _ => None,
    }
}

fn space(w: &[Token], i: usize) -> Option<()> {
    (sep(w, i) == Some(SeparatorKind::Space)).then_some(())
}

fn is_date_separator(s: SeparatorKind) -> bool {
    matches!(
        s,
        SeparatorKind::Slash | SeparatorKind::Hyphen | SeparatorKind::Point
    )
}

fn is_decimal_separator(s: SeparatorKind) -> bool {
    matches!(s, SeparatorKind::Comma | SeparatorKind::Point)
}

/// `[digits][comma or point][digits]` at the window front; returns the
/// folded text and the separator.
fn decimal_parts(w: &[Token]) -> Option<(String, SeparatorKind)> {
    let int = word(w, 0).filter(|t| digits(t))?;
    let s = sep(w, 1).filter(|s| is_decimal_separator(*s))?;
    let frac = word(w, 2).filter(|t| digits(t))?;
    Some((format!("{}{}{}", int, s.as_char(), frac), s))
}

fn digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn letters(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}

fn upper_single(s: &str) -> bool {
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

/// One uppercase letter followed by at least one more letter.
fn capitalized(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_uppercase() => chars.next().is_some() && chars.all(|c| c.is_alphabetic()),
        _ => false,
    }
}

fn parse_digits(s: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if !digits(s) || s.len() < min_len || s.len() > max_len {
        return None;
    }
    s.parse().ok()
}

/// Expands a two-digit year to the nearest past year relative to `pivot`.
fn expand_year(year: i32, pivot: i32) -> i32 {
    if year >= 100 {
        year
    } else if 2000 + year <= pivot {
        2000 + year
    } else {
        1900 + year
    }
}

/// Civil year of the current date, used as the two-digit-year pivot.
fn current_year() -> i32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    1970 + (secs / 31_556_952) as i32
}

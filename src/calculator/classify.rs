//! Query classification.
//!
//! Domains are tried in a fixed priority order and the first predicate that
//! matches wins, even when a later one would also match:
//! Equation > BaseConversion > CalendarExpression > CurrencyPlaceholder >
//! Statistics > Arithmetic.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

/// The calculation category a query is evaluated under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Equation,
    BaseConversion,
    CalendarExpression,
    CurrencyPlaceholder,
    Statistics,
    Arithmetic,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equation => "equation",
            Self::BaseConversion => "base conversion",
            Self::CalendarExpression => "calendar expression",
            Self::CurrencyPlaceholder => "currency",
            Self::Statistics => "statistics",
            Self::Arithmetic => "arithmetic",
        })
    }
}

const BASE_WORDS: &[&str] = &["hex", "bin", "oct", "dec"];
const BASE_FUNCTIONS: &[&str] = &["hex(", "bin(", "oct("];

pub(crate) const DATE_WORDS: &[&str] = &[
    "today", "now", "yesterday", "tomorrow", "days", "weeks", "months", "years", "between",
    "ago", "hence",
];

pub(crate) const STAT_FUNCTIONS: &[&str] =
    &["mean", "median", "mode", "stdev", "std", "variance", "avg"];

lazy_static! {
    static ref PREFIXED_LITERAL: Regex = Regex::new(r"\b(?:0x[0-9a-f]+|0b[01]+|0o[0-7]+)\b").unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap();
    static ref NUMERIC_DATE: Regex = Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").unwrap();
    static ref CURRENCY: Regex =
        Regex::new(r"(?i)\d+\s*[a-z]{3}\s*(?:to|in)\s*[a-z]{3}").unwrap();
}

/// Normalized, read-only view of a query shared by all predicates.
#[derive(Debug)]
pub struct QueryView<'a> {
    pub text: &'a str,
    pub lower: String,
    words: Vec<String>,
    identifiers: Vec<String>,
}

impl<'a> QueryView<'a> {
    pub fn new(text: &'a str) -> Self {
        let lower = text.to_lowercase();
        let words = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let identifiers = identifiers(&lower);
        Self {
            text,
            lower,
            words,
            identifiers,
        }
    }

    /// Whole-word, case-insensitive membership.
    pub fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn has_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.has_word(w))
    }

    /// Whether `name` appears as a standalone identifier token (so `2x` counts, `exp` does not).
    pub fn has_identifier(&self, name: &str) -> bool {
        self.identifiers.iter().any(|i| i == name)
    }
}

/// Identifier tokens of lowercase text, skipping numeric literals such as
/// `2.5`, `1e3` or `0x1f`.
fn identifiers(lower: &str) -> Vec<String> {
    let chars: Vec<char> = lower.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            let prefixed = c == '0'
                && matches!(chars.get(i + 1), Some('x' | 'b' | 'o'))
                && chars.get(i + 2).is_some_and(|c| c.is_ascii_hexdigit());
            if prefixed {
                i += 2;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
            } else {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
            }
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            out.push(chars[start..i].iter().collect());
        } else {
            i += 1;
        }
    }

    out
}

fn is_equation(q: &QueryView) -> bool {
    q.text.contains('=') && q.has_identifier("x")
}

fn is_base_conversion(q: &QueryView) -> bool {
    BASE_FUNCTIONS.iter().any(|f| q.lower.starts_with(f))
        || PREFIXED_LITERAL.is_match(&q.lower)
        || (q.has_word("to") && q.has_any_word(BASE_WORDS))
}

fn is_calendar(q: &QueryView) -> bool {
    q.has_any_word(DATE_WORDS) || ISO_DATE.is_match(q.text) || NUMERIC_DATE.is_match(q.text)
}

fn is_currency(q: &QueryView) -> bool {
    CURRENCY.is_match(q.text)
}

fn is_statistics(q: &QueryView) -> bool {
    STAT_FUNCTIONS.iter().any(|f| {
        q.lower
            .strip_prefix(f)
            .is_some_and(|rest| rest.starts_with('(') || rest.starts_with(' '))
    })
}

type Predicate = fn(&QueryView) -> bool;

/// Priority-ordered routing table. Arithmetic is the fallback and has no entry.
const ROUTES: &[(Domain, Predicate)] = &[
    (Domain::Equation, is_equation),
    (Domain::BaseConversion, is_base_conversion),
    (Domain::CalendarExpression, is_calendar),
    (Domain::CurrencyPlaceholder, is_currency),
    (Domain::Statistics, is_statistics),
];

/// Pick the domain for a trimmed query.
pub fn classify(query: &str) -> Domain {
    let view = QueryView::new(query);
    ROUTES
        .iter()
        .find(|(_, matches)| matches(&view))
        .map(|(domain, _)| *domain)
        .unwrap_or(Domain::Arithmetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equation_wins_over_everything() {
        assert_eq!(classify("2x=4"), Domain::Equation);
        assert_eq!(classify("X^2 = 9"), Domain::Equation);
        assert_eq!(classify("mean(x) = 3"), Domain::Equation);
    }

    #[test]
    fn test_equation_needs_bare_x() {
        assert_eq!(classify("exp(1)=2"), Domain::Arithmetic);
        assert_eq!(classify("0x1f=31"), Domain::BaseConversion);
        assert_eq!(classify("2 x 3"), Domain::Arithmetic);
    }

    #[test]
    fn test_base_conversion() {
        assert_eq!(classify("hex(255)"), Domain::BaseConversion);
        assert_eq!(classify("BIN(5)"), Domain::BaseConversion);
        assert_eq!(classify("0xFF"), Domain::BaseConversion);
        assert_eq!(classify("255 to hex"), Domain::BaseConversion);
        assert_eq!(classify("ff hex to dec"), Domain::BaseConversion);
        assert_eq!(classify("tomorrow to hex"), Domain::BaseConversion);
    }

    #[test]
    fn test_calendar() {
        assert_eq!(classify("today"), Domain::CalendarExpression);
        assert_eq!(classify("3 days ago"), Domain::CalendarExpression);
        assert_eq!(classify("2024-01-10 + 1 week"), Domain::CalendarExpression);
        assert_eq!(classify("10/01/2024"), Domain::CalendarExpression);
        assert_eq!(classify("days between 2024-01-01 and 2024-02-01"), Domain::CalendarExpression);
    }

    #[test]
    fn test_calendar_beats_statistics() {
        assert_eq!(classify("mean 3 days"), Domain::CalendarExpression);
    }

    #[test]
    fn test_currency() {
        assert_eq!(classify("100 USD to EUR"), Domain::CurrencyPlaceholder);
        assert_eq!(classify("5 gbp in jpy"), Domain::CurrencyPlaceholder);
    }

    #[test]
    fn test_statistics() {
        assert_eq!(classify("mean(1,2,3)"), Domain::Statistics);
        assert_eq!(classify("stdev 1 2 3"), Domain::Statistics);
        assert_eq!(classify("meanie(1)"), Domain::Arithmetic);
    }

    #[test]
    fn test_arithmetic_fallback() {
        assert_eq!(classify("2 + 2"), Domain::Arithmetic);
        assert_eq!(classify("50% of 200"), Domain::Arithmetic);
        assert_eq!(classify("foo(1)"), Domain::Arithmetic);
    }

    #[test]
    fn test_identifiers_skip_literals() {
        assert_eq!(identifiers("2x+exp(1)"), vec!["x", "exp"]);
        assert_eq!(identifiers("0x1f + x"), vec!["x"]);
        assert_eq!(identifiers("2.5e3"), vec!["e3"]);
    }
}

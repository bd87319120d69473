//! Query detection.
//!
//! Two gates sit in front of the classifier:
//! 1. [`is_query_text`]: length bound and a broad character allow-list.
//!    Text failing it is not a query at all.
//! 2. [`worth_evaluating`]: a cheap heuristic the poller uses to skip text
//!    that passes the allow-list but is plainly prose.

use lazy_static::lazy_static;
use regex::Regex;

/// Longest text, in characters, that is still considered a query.
pub const MAX_QUERY_LEN: usize = 250;

/// Keywords recognized by any of the domains.
const KEYWORDS: &[&str] = &[
    "sqrt", "log", "ln", "sin", "cos", "tan", "asin", "acos", "atan", "pi", "e", "abs",
    "factorial", "rad", "deg", "pow", "of", "today", "days", "weeks", "months", "years",
    "between", "now", "yesterday", "tomorrow", "ago", "hence", "mean", "median", "mode",
    "stdev", "std", "variance", "avg", "hex", "bin", "oct", "dec",
];

/// Glyphs that signal an operation.
const OPERATOR_GLYPHS: &[char] = &['+', '-', '*', '/', '%', '^', '=', '√'];

lazy_static! {
    /// Letters, digits, whitespace and the punctuation any domain can use.
    static ref QUERY_CHARS: Regex = Regex::new(
        r"^[a-zA-Z0-9\s\.,\+\-\*/%\^=√°\(\)\[\]\{\}:_]+$"
    ).unwrap();

    static ref KEYWORD: Regex = Regex::new(
        &format!(r"(?i)\b(?:{})\b", KEYWORDS.join("|"))
    ).unwrap();
}

/// Check the length bound and character allow-list.
pub fn is_query_text(input: &str) -> bool {
    !input.is_empty() && input.chars().count() <= MAX_QUERY_LEN && QUERY_CHARS.is_match(input)
}

/// Check whether allow-listed text resembles something computable.
///
/// True when the text has a digit, an operator glyph, a domain keyword,
/// or the letter `x`.
pub fn worth_evaluating(input: &str) -> bool {
    input.chars().any(|c| c.is_ascii_digit())
        || input.contains(OPERATOR_GLYPHS)
        || KEYWORD.is_match(input)
        || input.contains(['x', 'X'])
}

/// Both gates, applied to trimmed text. This is what the clipboard poller uses.
pub fn looks_like_query(input: &str) -> bool {
    let trimmed = input.trim();
    is_query_text(trimmed) && worth_evaluating(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_long() {
        assert!(!is_query_text(""));
        assert!(!is_query_text(&"1".repeat(MAX_QUERY_LEN + 1)));
        assert!(is_query_text(&"1".repeat(MAX_QUERY_LEN)));
    }

    #[test]
    fn test_rejects_foreign_characters() {
        assert!(!is_query_text("2 + 2;"));
        assert!(!is_query_text("print('hi')"));
        assert!(!is_query_text("a < b"));
        assert!(!is_query_text("__import__(\"os\")"));
    }

    #[test]
    fn test_accepts_domain_punctuation() {
        assert!(is_query_text("√(16) + 2^3"));
        assert!(is_query_text("90° = x"));
        assert!(is_query_text("mean[1, 2]"));
        assert!(is_query_text("12:30 - 10:00"));
    }

    #[test]
    fn test_worth_evaluating() {
        assert!(worth_evaluating("2"));
        assert!(worth_evaluating("pi"));
        assert!(worth_evaluating("today"));
        assert!(worth_evaluating("ff hex to dec"));
        assert!(worth_evaluating("x"));
        assert!(worth_evaluating("a - b"));
        assert!(!worth_evaluating("hello world"));
        assert!(!worth_evaluating("good morning"));
        assert!(worth_evaluating("firefox"));
    }

    #[test]
    fn test_looks_like_query_trims() {
        assert!(looks_like_query("  2 + 2  "));
        assert!(!looks_like_query("   "));
        assert!(!looks_like_query("just some words"));
    }
}

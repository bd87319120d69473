//! Overlay line for an evaluated query.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::calculator::Outcome;

/// Queries at least this long are shortened in the overlay.
const SHORTEN_AT: usize = 60;
const SHORT_LEN: usize = 57;

lazy_static! {
    static ref LEADING_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap();
    static ref LEADING_LITERAL: Regex = Regex::new(r"(?i)^(?:0x[0-9a-f]+|0b[01]+|0o[0-7]+)").unwrap();
}

/// How the line should be emphasized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Normal,
    Info,
    Error,
}

/// A rendered overlay line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayLine {
    pub text: String,
    pub tone: Tone,
}

/// Whether a result reads on its own (solutions, day counts, dates, base
/// literals) instead of as `query = result`.
pub fn is_structured(result: &str) -> bool {
    result.starts_with("x =")
        || result.contains("->")
        || result.to_lowercase().contains("days")
        || LEADING_DATE.is_match(result)
        || LEADING_LITERAL.is_match(result)
}

fn shorten(query: &str) -> String {
    if query.chars().count() < SHORTEN_AT {
        query.to_string()
    } else {
        let head: String = query.chars().take(SHORT_LEN).collect();
        format!("{head}...")
    }
}

impl DisplayLine {
    pub fn render(query: &str, outcome: &Outcome) -> Self {
        let tone = match outcome {
            Outcome::Value { .. } => Tone::Normal,
            Outcome::Info(_) => Tone::Info,
            Outcome::Error(_) => Tone::Error,
        };
        let result = outcome.to_string();
        let text = if tone != Tone::Normal || is_structured(&result) {
            result
        } else {
            format!("{} = {}", shorten(query), result)
        };
        Self { text, tone }
    }
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

//! Calculation history: a bounded ring of successful results.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;

use crate::calculator::{Calculator, Outcome, Solution};
use crate::display::is_structured;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

lazy_static! {
    static ref POWER: Regex = Regex::new(r"\^\s*(\([^)]*\)|[\w.\-]+)").unwrap();
    static ref FRACTION: Regex = Regex::new(r"([a-zA-Z0-9.]+)\s*/\s*([a-zA-Z0-9.]+)").unwrap();
}

/// One successful evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: NaiveDateTime,
    pub query: String,
    pub result: String,
    /// Present for equation results, used for typeset re-rendering.
    pub solution: Option<Solution>,
}

impl HistoryEntry {
    /// An entry for a value outcome; infos and errors are not recorded.
    pub fn from_outcome(query: &str, outcome: &Outcome, timestamp: NaiveDateTime) -> Option<Self> {
        match outcome {
            Outcome::Value { value, solution } => Some(Self {
                timestamp,
                query: query.to_string(),
                result: value.to_string(),
                solution: *solution,
            }),
            _ => None,
        }
    }

    fn is_equation(&self) -> bool {
        self.result.starts_with("x =")
    }

    /// `[ts] query => result` for structured results, `[ts] query = result`
    /// otherwise.
    pub fn listing(&self) -> String {
        let sep = if is_structured(&self.result) { "=>" } else { "=" };
        format!(
            "[{}] {} {} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.query,
            sep,
            self.result
        )
    }

    /// The entry as inline LaTeX, e.g. `$x^{2}=4 \Rightarrow x = -2$`.
    pub fn to_latex(&self, calculator: &Calculator) -> String {
        let query = latex_query(&self.query);
        let result = match self.solution.and_then(|s| calculator.solution_markup(&s)) {
            Some(markup) if self.is_equation() => format!("x = {markup}"),
            Some(markup) => markup,
            None => self.result.clone(),
        };
        let sep = if self.is_equation() { " \\Rightarrow " } else { " = " };
        format!("${query}{sep}{result}$")
    }
}

/// Rewrite `sqrt(..)` calls as `\sqrt{..}`, keeping nested parentheses intact.
fn latex_radicals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(i) = rest.find("sqrt(") {
        out.push_str(&rest[..i]);
        out.push_str("\\sqrt{");
        let inner = &rest[i + "sqrt(".len()..];

        let mut depth = 1;
        let close = inner.char_indices().find_map(|(j, c)| {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            (depth == 0).then_some(j)
        });
        match close {
            Some(j) => {
                out.push_str(&latex_radicals(&inner[..j]));
                out.push('}');
                rest = &inner[j + 1..];
            }
            None => rest = inner,
        }
    }
    out.push_str(rest);
    out
}

fn latex_query(query: &str) -> String {
    let text = latex_radicals(query);
    let text = POWER.replace_all(&text, "^{${1}}");
    let text = text.replace('*', " \\times ");
    FRACTION
        .replace_all(&text, "\\frac{${1}}{${2}}")
        .into_owned()
}

/// Receives every successful evaluation.
pub trait HistorySink {
    fn record(&mut self, entry: HistoryEntry);
}

/// In-memory history that drops the oldest entry once full.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the bound, discarding the oldest entries that no longer fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, newest first.
    pub fn recent(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Listing lines, newest first.
    pub fn listing(&self) -> Vec<String> {
        self.recent().map(HistoryEntry::listing).collect()
    }
}

impl HistorySink for History {
    fn record(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

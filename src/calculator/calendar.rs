//! Date arithmetic: `today + 1 week`, `3 days ago`, `days between X and Y`,
//! `2024-03-01 - 2024-02-01`.

use chrono::{Duration, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::capability::{CalendarArithmetic, Interval, IntervalUnit, ProviderError};
use super::outcome::{CalcError, Value};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const LONG_FORMAT: &str = "%A, %B %d, %Y";

lazy_static! {
    static ref TODAY: Regex = Regex::new(r"(?i)\btoday\b").unwrap();
    static ref YESTERDAY: Regex = Regex::new(r"(?i)\byesterday\b").unwrap();
    static ref TOMORROW: Regex = Regex::new(r"(?i)\btomorrow\b").unwrap();
    static ref NOW: Regex = Regex::new(r"(?i)\bnow\b").unwrap();

    /// `<date> (+|-) <N> <unit>`
    static ref DELTA: Regex = Regex::new(
        r"(?i)^(.+?)\s*([+-])\s*(\d+)\s*(days?|d|weeks?|wk|w|months?|mon|mo|years?|yr|y)\b"
    )
    .unwrap();

    /// `<N> <unit> ago|hence|from now|earlier|later`; `now` may already be
    /// substituted by its literal.
    static ref AGO_HENCE: Regex = Regex::new(
        r"(?i)(\d+)\s*(days?|weeks?|months?|years?)\s*(ago|hence|from\s+now|from\s+\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}|earlier|later)\b"
    )
    .unwrap();

    static ref BETWEEN: Regex = Regex::new(r"(?i)(?:^|\s+)between\s+").unwrap();
    static ref AND: Regex = Regex::new(r"(?i)\s+and\s+").unwrap();
    static ref TIME_OF_DAY: Regex = Regex::new(r"(?i):|\b(?:am|pm)\b|\d(?:am|pm|h|m|s)\b").unwrap();
}

const KEYWORDS: [&str; 4] = ["today", "now", "yesterday", "tomorrow"];

fn unit_of(word: &str) -> IntervalUnit {
    let word = word.to_lowercase();
    if word.starts_with('d') {
        IntervalUnit::Days
    } else if word.starts_with('w') {
        IntervalUnit::Weeks
    } else if word.starts_with("mo") {
        IntervalUnit::Months
    } else {
        IntervalUnit::Years
    }
}

/// Replace the relative keywords by concrete literals derived from `now`.
pub fn substitute_keywords(text: &str, now: NaiveDateTime) -> String {
    let day = |offset: i64| (now + Duration::days(offset)).format(DATE_FORMAT).to_string();
    let text = TODAY.replace_all(text, day(0).as_str());
    let text = YESTERDAY.replace_all(&text, day(-1).as_str());
    let text = TOMORROW.replace_all(&text, day(1).as_str());
    NOW.replace_all(&text, now.format(DATETIME_FORMAT).to_string().as_str())
        .into_owned()
}

/// Split `a - b` at a whitespace-adjacent `-`, or at the only `-` there is.
/// ISO dates contain dashes of their own and are never split.
fn split_subtraction(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let dashes: Vec<usize> = text.match_indices('-').map(|(i, _)| i).collect();
    let spaced = dashes.iter().copied().find(|&i| {
        let before = i > 0 && bytes[i - 1].is_ascii_whitespace();
        let after = bytes.get(i + 1).is_some_and(u8::is_ascii_whitespace);
        before || after
    });
    let at = match (spaced, dashes.as_slice()) {
        (Some(i), _) => i,
        (None, [only]) => *only,
        _ => return None,
    };
    let (lhs, rhs) = (text[..at].trim(), text[at + 1..].trim());
    (!lhs.is_empty() && !rhs.is_empty()).then_some((lhs, rhs))
}

/// Python-style duration text: `-1 day, 23:00:00`, `2 days, 0:00:00`, `5:30:00`.
pub fn format_duration(delta: Duration) -> String {
    let total = delta.num_seconds();
    let days = total.div_euclid(86_400);
    let rest = total.rem_euclid(86_400);
    let clock = format!("{}:{:02}:{:02}", rest / 3600, rest % 3600 / 60, rest % 60);
    match days {
        0 => clock,
        1 | -1 => format!("{days} day, {clock}"),
        _ => format!("{days} days, {clock}"),
    }
}

fn invalid() -> CalcError {
    CalcError::parse("Invalid date format or operation")
}

fn parse_date(
    calendar: &dyn CalendarArithmetic,
    text: &str,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, CalcError> {
    calendar.parse(text, now).map_err(|e| {
        debug!("Date parse failed for '{}': {}", text, e);
        invalid()
    })
}

fn shift(
    calendar: &dyn CalendarArithmetic,
    at: NaiveDateTime,
    amount: i64,
    unit: IntervalUnit,
) -> Result<NaiveDateTime, CalcError> {
    calendar
        .shift(at, Interval { amount, unit })
        .map_err(|e| match e {
            ProviderError::Parse(_) => invalid(),
            ProviderError::Domain(msg) => CalcError::failed("Date calculation", msg),
        })
}

fn amount(digits: &str) -> Result<i64, CalcError> {
    digits
        .parse()
        .map_err(|_| CalcError::failed("Date calculation", "interval too large"))
}

/// Evaluate a calendar query relative to `now`.
pub fn evaluate(
    text: &str,
    calendar: &dyn CalendarArithmetic,
    now: NaiveDateTime,
) -> Result<Value, CalcError> {
    let original = text.trim();
    let substituted = substitute_keywords(original, now);
    debug!("Date expr after keyword sub: '{}'", substituted);

    if KEYWORDS.contains(&original.to_lowercase().as_str()) {
        let at = parse_date(calendar, &substituted, now)?;
        return Ok(Value::text(at.format(LONG_FORMAT).to_string()));
    }

    if let Some(caps) = DELTA.captures(&substituted) {
        let base = parse_date(calendar, caps[1].trim(), now)?;
        let n = amount(&caps[3])?;
        let signed = if &caps[2] == "-" { -n } else { n };
        let at = shift(calendar, base, signed, unit_of(&caps[4]))?;
        return Ok(Value::text(at.format(DATE_FORMAT).to_string()));
    }

    if let Some(caps) = AGO_HENCE.captures(&substituted) {
        let (start, _) = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        let prefix = substituted[..start].trim();
        let base = if prefix.is_empty() {
            now
        } else {
            parse_date(calendar, prefix, now)?
        };
        let n = amount(&caps[1])?;
        let direction = caps[3].to_lowercase();
        let signed = if direction == "ago" || direction == "earlier" { -n } else { n };
        let at = shift(calendar, base, signed, unit_of(&caps[2]))?;
        return Ok(Value::text(at.format(DATE_FORMAT).to_string()));
    }

    let lower = substituted.to_lowercase();
    let mentions_between = lower.contains("between") && lower.contains("and");
    if mentions_between {
        let mut halves = BETWEEN.splitn(&substituted, 2);
        halves.next();
        if let Some(rest) = halves.next() {
            let mut sides = AND.splitn(rest, 2);
            if let (Some(a), Some(b)) = (sides.next(), sides.next()) {
                match (calendar.parse(a.trim(), now), calendar.parse(b.trim(), now)) {
                    (Ok(a), Ok(b)) => {
                        let days = (b.date() - a.date()).num_days().abs();
                        return Ok(Value::text(format!("{days} days")));
                    }
                    _ => debug!("Date 'between' parse failed for '{}'", rest),
                }
            }
        }
    }

    let split = split_subtraction(&substituted);
    if let Some((a, b)) = split {
        match (calendar.parse(a, now), calendar.parse(b, now)) {
            (Ok(x), Ok(y)) => {
                if TIME_OF_DAY.is_match(a) || TIME_OF_DAY.is_match(b) {
                    return Ok(Value::text(format_duration(x - y)));
                }
                let days = (x.date() - y.date()).num_days();
                return Ok(Value::text(format!("{days} days")));
            }
            _ => debug!("Date subtraction parse failed for '{}'", substituted),
        }
    }

    if !mentions_between && split.is_none() {
        if let Ok(at) = calendar.parse(original, now) {
            return Ok(Value::text(at.format(LONG_FORMAT).to_string()));
        }
    }

    Err(CalcError::Unrecognized("Date expression not recognized".into()))
}

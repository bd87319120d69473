//! Built-in calendar provider: a forgiving date/time parser and
//! calendar-correct interval arithmetic on top of `chrono`.
//!
//! Accepted pieces, in any order: ISO dates (`2024-01-10`, optionally
//! `T12:30`), numeric dates (`1/10/2024`, day-first when the first part
//! cannot be a month, two-digit years), month names (`jan`, `January`),
//! weekday names (ignored), ordinal days (`3rd`), times (`14:05`,
//! `9:30:15`, `5pm`, `5 pm`) and a lone four-digit year. Missing date
//! parts come from the reference moment; a missing time is midnight.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

use super::capability::{CalendarArithmetic, Interval, IntervalUnit, ProviderError};

lazy_static! {
    static ref ISO: Regex =
        Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:t(\d{1,2}:\d{2}(?::\d{2})?))?$").unwrap();
    static ref YEAR_FIRST: Regex = Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2})$").unwrap();
    static ref NUMERIC: Regex = Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2}|\d{4})$").unwrap();
    static ref CLOCK: Regex = Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?(am|pm)?$").unwrap();
    static ref HOUR_MERIDIEM: Regex = Regex::new(r"^(\d{1,2})(am|pm)$").unwrap();
    static ref ORDINAL: Regex = Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)$").unwrap();
    static ref NUMBER: Regex = Regex::new(r"^\d+$").unwrap();
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const FILLER: [&str; 4] = ["at", "on", "of", "the"];

fn month_from_name(word: &str) -> Option<u32> {
    if word == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|m| word.len() >= 3 && m.starts_with(word))
        .map(|i| i as u32 + 1)
}

fn is_weekday(word: &str) -> bool {
    WEEKDAYS
        .iter()
        .any(|d| word.len() >= 3 && d.starts_with(word))
}

/// Two-digit years follow the POSIX `%y` pivot.
fn expand_year(text: &str) -> i32 {
    let y: i32 = text.parse().unwrap_or(0);
    match text.len() {
        2 if y < 69 => 2000 + y,
        2 => 1900 + y,
        _ => y,
    }
}

fn bad(text: &str) -> ProviderError {
    ProviderError::Parse(format!("unrecognized date component '{text}'"))
}

fn number<T: std::str::FromStr>(text: &str) -> Result<T, ProviderError> {
    text.parse().map_err(|_| bad(text))
}

#[derive(Debug, Default)]
struct Fields {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: u32,
    second: u32,
}

impl Fields {
    fn set<T>(slot: &mut Option<T>, value: T, token: &str) -> Result<(), ProviderError> {
        if slot.is_some() {
            return Err(bad(token));
        }
        *slot = Some(value);
        Ok(())
    }

    fn date(&mut self, y: i32, m: u32, d: u32, token: &str) -> Result<(), ProviderError> {
        Self::set(&mut self.year, y, token)?;
        Self::set(&mut self.month, m, token)?;
        Self::set(&mut self.day, d, token)
    }

    fn clock(&mut self, text: &str, token: &str) -> Result<(), ProviderError> {
        let caps = CLOCK.captures(text).ok_or_else(|| bad(token))?;
        Self::set(&mut self.hour, number(&caps[1])?, token)?;
        self.minute = number(&caps[2])?;
        self.second = caps.get(3).map(|m| number(m.as_str())).transpose()?.unwrap_or(0);
        if let Some(meridiem) = caps.get(4) {
            self.meridiem(meridiem.as_str(), token)?;
        }
        Ok(())
    }

    fn meridiem(&mut self, which: &str, token: &str) -> Result<(), ProviderError> {
        let hour = self.hour.ok_or_else(|| bad(token))?;
        if !(1..=12).contains(&hour) {
            return Err(bad(token));
        }
        self.hour = Some(match (which, hour) {
            ("am", 12) => 0,
            ("am", h) => h,
            ("pm", 12) => 12,
            (_, h) => h + 12,
        });
        Ok(())
    }

    fn token(&mut self, token: &str, next: Option<&str>) -> Result<(), ProviderError> {
        if let Some(caps) = ISO.captures(token) {
            self.date(number(&caps[1])?, number(&caps[2])?, number(&caps[3])?, token)?;
            if let Some(time) = caps.get(4) {
                self.clock(time.as_str(), token)?;
            }
        } else if let Some(caps) = YEAR_FIRST.captures(token) {
            self.date(number(&caps[1])?, number(&caps[2])?, number(&caps[3])?, token)?;
        } else if let Some(caps) = NUMERIC.captures(token) {
            let (a, b): (u32, u32) = (number(&caps[1])?, number(&caps[2])?);
            let (month, day) = if a > 12 { (b, a) } else { (a, b) };
            self.date(expand_year(&caps[3]), month, day, token)?;
        } else if CLOCK.is_match(token) {
            self.clock(token, token)?;
        } else if let Some(caps) = HOUR_MERIDIEM.captures(token) {
            Self::set(&mut self.hour, number(&caps[1])?, token)?;
            self.meridiem(&caps[2], token)?;
        } else if token == "am" || token == "pm" {
            self.meridiem(token, token)?;
        } else if let Some(caps) = ORDINAL.captures(token) {
            Self::set(&mut self.day, number(&caps[1])?, token)?;
        } else if NUMBER.is_match(token) {
            if token.len() == 4 {
                Self::set(&mut self.year, number(token)?, token)?;
            } else if matches!(next, Some("am" | "pm")) {
                Self::set(&mut self.hour, number(token)?, token)?;
            } else if token.len() <= 2 && self.day.is_none() {
                self.day = Some(number(token)?);
            } else if token.len() == 2 && self.year.is_none() {
                self.year = Some(expand_year(token));
            } else {
                return Err(bad(token));
            }
        } else if let Some(month) = month_from_name(token) {
            Self::set(&mut self.month, month, token)?;
        } else if !(is_weekday(token) || FILLER.contains(&token)) {
            return Err(bad(token));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none() && self.hour.is_none()
    }

    fn resolve(self, now: NaiveDateTime) -> Result<NaiveDateTime, ProviderError> {
        let year = self.year.unwrap_or(now.year());
        let month = self.month.unwrap_or(now.month());
        let day = self.day.unwrap_or(now.day());
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| ProviderError::Domain("day is out of range for month".into()))?;
        let time = NaiveTime::from_hms_opt(self.hour.unwrap_or(0), self.minute, self.second)
            .ok_or_else(|| ProviderError::Domain("time is out of range".into()))?;
        Ok(date.and_time(time))
    }
}

/// Calendar provider backed by `chrono`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChronoCalendar;

impl CalendarArithmetic for ChronoCalendar {
    fn parse(&self, text: &str, now: NaiveDateTime) -> Result<NaiveDateTime, ProviderError> {
        let lower = text.trim().to_lowercase().replace(',', " ");
        let tokens: Vec<&str> = lower.split_whitespace().collect();

        let mut fields = Fields::default();
        for (i, token) in tokens.iter().enumerate() {
            fields.token(token, tokens.get(i + 1).copied())?;
        }
        if fields.is_empty() {
            return Err(ProviderError::Parse(format!("no date in '{}'", text.trim())));
        }
        fields.resolve(now)
    }

    fn shift(&self, at: NaiveDateTime, interval: Interval) -> Result<NaiveDateTime, ProviderError> {
        let overflow = || ProviderError::Domain("date value out of range".into());
        let n = interval.amount;
        match interval.unit {
            IntervalUnit::Days | IntervalUnit::Weeks => {
                let days = if interval.unit == IntervalUnit::Weeks {
                    n.checked_mul(7).ok_or_else(overflow)?
                } else {
                    n
                };
                let delta = Duration::try_days(days).ok_or_else(overflow)?;
                at.checked_add_signed(delta).ok_or_else(overflow)
            }
            IntervalUnit::Months | IntervalUnit::Years => {
                let months = if interval.unit == IntervalUnit::Years {
                    n.checked_mul(12).ok_or_else(overflow)?
                } else {
                    n
                };
                let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| overflow())?;
                if months < 0 {
                    at.checked_sub_months(Months::new(magnitude))
                } else {
                    at.checked_add_months(Months::new(magnitude))
                }
                .ok_or_else(overflow)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(15, 45, 0)
            .unwrap()
    }

    fn parse(text: &str) -> String {
        ChronoCalendar
            .parse(text, now())
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    #[test]
    fn test_iso() {
        assert_eq!(parse("2024-03-05"), "2024-03-05 00:00:00");
        assert_eq!(parse("2024-03-05 14:30:15"), "2024-03-05 14:30:15");
        assert_eq!(parse("2024-03-05T08:15"), "2024-03-05 08:15:00");
    }

    #[test]
    fn test_numeric_dates() {
        assert_eq!(parse("3/5/2024"), "2024-03-05 00:00:00");
        assert_eq!(parse("25/12/2023"), "2023-12-25 00:00:00");
        assert_eq!(parse("12-25-23"), "2023-12-25 00:00:00");
        assert_eq!(parse("2024/02/29"), "2024-02-29 00:00:00");
    }

    #[test]
    fn test_month_names() {
        assert_eq!(parse("March 5, 2024"), "2024-03-05 00:00:00");
        assert_eq!(parse("5 mar 2024"), "2024-03-05 00:00:00");
        assert_eq!(parse("Friday, Dec 25th 2026"), "2026-12-25 00:00:00");
        assert_eq!(parse("feb 3"), "2024-02-03 00:00:00");
    }

    #[test]
    fn test_times() {
        assert_eq!(parse("5pm"), "2024-01-10 17:00:00");
        assert_eq!(parse("2024-01-01 12 am"), "2024-01-01 00:00:00");
        assert_eq!(parse("9:30:15"), "2024-01-10 09:30:15");
    }

    #[test]
    fn test_lone_year_keeps_month_and_day() {
        assert_eq!(parse("2020"), "2020-01-10 00:00:00");
    }

    #[test]
    fn test_rejects() {
        let calendar = ChronoCalendar;
        assert!(matches!(calendar.parse("banana", now()), Err(ProviderError::Parse(_))));
        assert!(matches!(calendar.parse("", now()), Err(ProviderError::Parse(_))));
        assert!(matches!(
            calendar.parse("2023-02-30", now()),
            Err(ProviderError::Domain(_))
        ));
        assert!(calendar.parse("2024-01-01 2024-02-02", now()).is_err());
    }

    #[test]
    fn test_shift_is_calendar_correct() {
        let calendar = ChronoCalendar;
        let jan31 = calendar.parse("2024-01-31", now()).unwrap();
        let shift = |amount, unit| {
            calendar
                .shift(jan31, Interval { amount, unit })
                .unwrap()
                .format("%Y-%m-%d")
                .to_string()
        };
        assert_eq!(shift(1, IntervalUnit::Months), "2024-02-29");
        assert_eq!(shift(-1, IntervalUnit::Years), "2023-01-31");
        assert_eq!(shift(2, IntervalUnit::Weeks), "2024-02-14");
        assert_eq!(shift(-31, IntervalUnit::Days), "2023-12-31");
    }
}

//! Clipboard calculator core.
//!
//! This module provides functionality to:
//! - Reject text that is not a query at all ([`is_query_text`])
//! - Route a query to exactly one [`Domain`] ([`classify`])
//! - Evaluate it under that domain's rules into an [`Outcome`]
//! - Copy results to the clipboard
//!
//! Equations, dates and statistics go through injected capability
//! providers; a [`Calculator`] built without one answers with a one-time
//! notice and an error afterwards.

pub mod arith;
pub mod base;
pub mod calendar;
mod capability;
mod classify;
mod clipboard;
pub mod dates;
mod detection;
pub mod equation;
pub mod format;
mod outcome;
mod special;
pub mod stats;
pub mod symbolic;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, error, warn};

pub use capability::{
    CalendarArithmetic, Capability, CapabilityKind, CapabilityState, DescriptiveStatistics,
    Interval, IntervalUnit, Phase, ProviderError, SymbolicAlgebra,
};
pub use classify::{Domain, QueryView, classify};
pub use clipboard::{ClipboardSource, copy_to_clipboard};
pub use dates::ChronoCalendar;
pub use detection::{MAX_QUERY_LEN, is_query_text, looks_like_query, worth_evaluating};
pub use outcome::{CalcError, ErrorKind, Number, Outcome, Value};
pub use stats::SampleStatistics;
pub use symbolic::{Solution, SymbolicEngine};

/// Fixed answer for currency conversions.
pub const CURRENCY_NOTICE: &str = "Currency conversion via API is planned.";

/// The evaluation entry point, holding the capability decisions made at
/// construction.
///
/// Clones share capability state, so a missing capability is announced
/// once across all of them.
#[derive(Clone, Debug)]
pub struct Calculator {
    symbolic: Capability<dyn SymbolicAlgebra>,
    calendar: Capability<dyn CalendarArithmetic>,
    statistics: Capability<dyn DescriptiveStatistics>,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    /// A calculator with the built-in provider for every capability.
    pub fn new() -> Self {
        Self {
            symbolic: Capability::available(
                CapabilityKind::SymbolicAlgebra,
                Arc::new(SymbolicEngine),
            ),
            calendar: Capability::available(
                CapabilityKind::CalendarArithmetic,
                Arc::new(ChronoCalendar),
            ),
            statistics: Capability::available(
                CapabilityKind::Statistics,
                Arc::new(SampleStatistics),
            ),
        }
    }

    pub fn with_symbolic(mut self, provider: Arc<dyn SymbolicAlgebra>) -> Self {
        self.symbolic = Capability::available(CapabilityKind::SymbolicAlgebra, provider);
        self
    }

    pub fn with_calendar(mut self, provider: Arc<dyn CalendarArithmetic>) -> Self {
        self.calendar = Capability::available(CapabilityKind::CalendarArithmetic, provider);
        self
    }

    pub fn with_statistics(mut self, provider: Arc<dyn DescriptiveStatistics>) -> Self {
        self.statistics = Capability::available(CapabilityKind::Statistics, provider);
        self
    }

    /// Mark a capability as missing for the lifetime of this calculator.
    pub fn without(mut self, kind: CapabilityKind) -> Self {
        warn!("{} unavailable; related queries will be reported", kind);
        match kind {
            CapabilityKind::SymbolicAlgebra => self.symbolic = Capability::unavailable(kind),
            CapabilityKind::CalendarArithmetic => self.calendar = Capability::unavailable(kind),
            CapabilityKind::Statistics => self.statistics = Capability::unavailable(kind),
        }
        self
    }

    pub fn phase(&self, kind: CapabilityKind) -> Phase {
        match kind {
            CapabilityKind::SymbolicAlgebra => self.symbolic.phase(),
            CapabilityKind::CalendarArithmetic => self.calendar.phase(),
            CapabilityKind::Statistics => self.statistics.phase(),
        }
    }

    /// Evaluate a query.
    ///
    /// Returns `None` if the trimmed text is not a query at all (empty, too
    /// long, or outside the character allow-list).
    pub fn evaluate(&self, query: &str, now: NaiveDateTime) -> Option<Outcome> {
        let query = query.trim();
        if !is_query_text(query) {
            debug!("Not a query: '{}'", query);
            return None;
        }
        let domain = classify(query);
        debug!("Routing '{}' to {}", query, domain);
        Some(self.dispatch(domain, query, now))
    }

    /// Evaluate `text` under a specific domain. Always yields an outcome;
    /// an unexpected failure inside a handler becomes a calculation error.
    pub fn dispatch(&self, domain: Domain, text: &str, now: NaiveDateTime) -> Outcome {
        panic::catch_unwind(AssertUnwindSafe(|| self.run(domain, text, now))).unwrap_or_else(
            |payload| {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!("Internal failure evaluating '{}' as {}: {}", text, domain, reason);
                Outcome::Error(CalcError::failed("Calculation", "internal"))
            },
        )
    }

    fn run(&self, domain: Domain, text: &str, now: NaiveDateTime) -> Outcome {
        match domain {
            Domain::Equation => match self.symbolic.require() {
                Ok(algebra) => match equation::solve(text, algebra) {
                    Ok((value, solution)) => Outcome::Value {
                        value,
                        solution: Some(solution),
                    },
                    Err(e) => Outcome::Error(e),
                },
                Err(notice) => notice,
            },
            Domain::BaseConversion => base::convert(text).into(),
            Domain::CalendarExpression => match self.calendar.require() {
                Ok(provider) => calendar::evaluate(text, provider, now).into(),
                Err(notice) => notice,
            },
            Domain::CurrencyPlaceholder => Outcome::Info(CURRENCY_NOTICE.into()),
            Domain::Statistics => match self.statistics.require() {
                Ok(provider) => stats::evaluate(text, provider).into(),
                Err(notice) => notice,
            },
            Domain::Arithmetic => arith::evaluate(text).into(),
        }
    }

    /// Typeset text of an equation solution, if symbolic algebra is present.
    pub fn solution_markup(&self, solution: &Solution) -> Option<String> {
        self.symbolic.provider().map(|p| p.to_markup(solution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn eval(calc: &Calculator, query: &str) -> Outcome {
        calc.evaluate(query, now()).unwrap()
    }

    fn text(query: &str) -> String {
        let outcome = eval(&Calculator::new(), query);
        assert!(outcome.is_value(), "{query}: {outcome}");
        outcome.to_string()
    }

    #[test]
    fn test_equation_wins_priority() {
        let outcome = eval(&Calculator::new(), "2x=4");
        assert_eq!(outcome.to_string(), "x = 2");
        match outcome {
            Outcome::Value { solution, .. } => assert_eq!(solution, Some(Solution::real(2.0))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_domain_examples() {
        assert_eq!(text("0xFF to dec"), "255");
        assert_eq!(text("255 to hex"), "0xff");
        assert_eq!(text("3 days ago"), "2024-01-07");
        assert_eq!(text("today + 1 week"), "2024-01-17");
        assert_eq!(text("mean(1,2,3)"), "2");
        assert_eq!(text("50% of 200"), "100");
        assert_eq!(text("25%"), "0.25");
    }

    #[test]
    fn test_domain_errors() {
        let calc = Calculator::new();
        assert!(matches!(
            eval(&calc, "stdev(5)").error(),
            Some(CalcError::InsufficientData(_))
        ));
        assert_eq!(eval(&calc, "10/0").error(), Some(&CalcError::DivisionByZero));
        assert_eq!(
            eval(&calc, "foo(1)").to_string(),
            "Error: Unknown function/variable 'foo'"
        );
    }

    #[test]
    fn test_currency_is_info() {
        assert_eq!(
            eval(&Calculator::new(), "100 usd to eur"),
            Outcome::Info(CURRENCY_NOTICE.into())
        );
    }

    #[test]
    fn test_not_a_query() {
        let calc = Calculator::new();
        assert_eq!(calc.evaluate("", now()), None);
        assert_eq!(calc.evaluate("   ", now()), None);
        assert_eq!(calc.evaluate("what?!", now()), None);
        assert_eq!(calc.evaluate(&"1+".repeat(200), now()), None);
    }

    #[test]
    fn test_missing_capability_notifies_once() {
        let calc = Calculator::new().without(CapabilityKind::Statistics);
        assert_eq!(calc.phase(CapabilityKind::Statistics), Phase::Unnotified);

        assert_eq!(
            eval(&calc, "mean(1,2,3)"),
            Outcome::Info(CapabilityKind::Statistics.notice().into())
        );
        assert_eq!(
            eval(&calc.clone(), "median 1 2"),
            Outcome::Error(CalcError::Unsupported(CapabilityKind::Statistics))
        );
        assert_eq!(calc.phase(CapabilityKind::Statistics), Phase::Notified);

        // other domains are unaffected
        assert_eq!(eval(&calc, "1+1").to_string(), "2");
        assert_eq!(calc.phase(CapabilityKind::SymbolicAlgebra), Phase::Available);
    }

    #[test]
    fn test_capability_gate_precedes_grammar() {
        let calc = Calculator::new().without(CapabilityKind::CalendarArithmetic);
        assert!(eval(&calc, "tomorrow - garbage").is_info());
        assert!(eval(&calc, "today").is_error());
    }

    #[test]
    fn test_repeated_evaluation_is_deterministic() {
        let calc = Calculator::new();
        for query in ["x^2 = 9", "1/3", "2024-03-01 - 2024-01-01", "mode 1 1 2", "bin(10)"] {
            assert_eq!(eval(&calc, query), eval(&calc, query), "{query}");
        }
    }

    struct Exploding;

    impl DescriptiveStatistics for Exploding {
        fn mean(&self, _: &[f64]) -> Result<f64, ProviderError> {
            panic!("boom")
        }
        fn median(&self, _: &[f64]) -> Result<f64, ProviderError> {
            panic!("boom")
        }
        fn mode(&self, _: &[f64]) -> Result<f64, ProviderError> {
            panic!("boom")
        }
        fn stdev(&self, _: &[f64]) -> Result<f64, ProviderError> {
            panic!("boom")
        }
        fn variance(&self, _: &[f64]) -> Result<f64, ProviderError> {
            panic!("boom")
        }
    }

    #[test]
    fn test_handler_panic_becomes_error() {
        let calc = Calculator::new().with_statistics(Arc::new(Exploding));
        assert_eq!(
            eval(&calc, "mean 1 2"),
            Outcome::Error(CalcError::failed("Calculation", "internal"))
        );
    }

    #[test]
    fn test_solution_markup() {
        let calc = Calculator::new();
        assert_eq!(
            calc.solution_markup(&Solution::real(0.5)).as_deref(),
            Some("\\frac{1}{2}")
        );
        let bare = Calculator::new().without(CapabilityKind::SymbolicAlgebra);
        assert_eq!(bare.solution_markup(&Solution::real(0.5)), None);
    }
}

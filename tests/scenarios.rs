//! End-to-end scenarios through the public `Calculator` API.

use chrono::{NaiveDate, NaiveDateTime};
use clipcalc::calculator::{
    CalcError, Calculator, CapabilityKind, Domain, ErrorKind, Outcome, Phase, classify,
};
use clipcalc::display::{DisplayLine, Tone};
use clipcalc::history::{History, HistoryEntry, HistorySink};

fn frozen_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(15, 45, 0)
        .unwrap()
}

fn evaluate(calc: &Calculator, query: &str) -> Outcome {
    calc.evaluate(query, frozen_now())
        .unwrap_or_else(|| panic!("'{query}' was not accepted as a query"))
}

fn value(query: &str) -> String {
    let outcome = evaluate(&Calculator::new(), query);
    assert!(outcome.is_value(), "{query} -> {outcome}");
    outcome.to_string()
}

#[test]
fn test_equation_has_priority_over_arithmetic() {
    assert_eq!(classify("2x=4"), Domain::Equation);
    assert_eq!(value("2x=4"), "x = 2");
}

#[test]
fn test_classification_order() {
    let cases = [
        ("x^2 = 9", Domain::Equation),
        ("hex(255)", Domain::BaseConversion),
        ("0x10 + 1", Domain::BaseConversion),
        ("3 days ago", Domain::CalendarExpression),
        ("2024-01-01 - 2023-12-25", Domain::CalendarExpression),
        ("100 usd to eur", Domain::CurrencyPlaceholder),
        ("mean 1 2 3", Domain::Statistics),
        ("2 + 2", Domain::Arithmetic),
        ("exp(1)", Domain::Arithmetic),
    ];
    for (query, domain) in cases {
        assert_eq!(classify(query), domain, "{query}");
    }
}

#[test]
fn test_equation_roots_far_from_zero() {
    assert_eq!(value("√x = 20"), "x = 400");
    assert_eq!(value("ln(x) = 5"), "x = 148.4131591");
}

#[test]
fn test_nested_repetition_is_rejected() {
    let outcome = evaluate(&Calculator::new(), "((1,)*10000,)*10000");
    assert_eq!(outcome.error(), Some(&CalcError::Overflow));
}

#[test]
fn test_base_conversion() {
    assert_eq!(value("0xFF to dec"), "255");
    assert_eq!(value("255 to hex"), "0xff");
    assert_eq!(value("bin(10)"), "0b1010");
    assert_eq!(value("0o17"), "15 (decimal)");
}

#[test]
fn test_calendar_with_frozen_now() {
    assert_eq!(value("3 days ago"), "2024-01-07");
    assert_eq!(value("today + 1 week"), "2024-01-17");
    assert_eq!(value("today"), "Wednesday, January 10, 2024");
    assert_eq!(value("between 2024-01-01 and 2024-01-15"), "14 days");
}

#[test]
fn test_statistics() {
    assert_eq!(value("mean(1,2,3)"), "2");
    let outcome = evaluate(&Calculator::new(), "stdev(5)");
    assert!(matches!(outcome.error(), Some(CalcError::InsufficientData(_))));
    assert_eq!(outcome.error().map(CalcError::kind), Some(ErrorKind::Semantic));
}

#[test]
fn test_arithmetic_percentages() {
    assert_eq!(value("50% of 200"), "100");
    assert_eq!(value("25%"), "0.25");
}

#[test]
fn test_arithmetic_errors() {
    let calc = Calculator::new();
    assert_eq!(
        evaluate(&calc, "10/0").error(),
        Some(&CalcError::DivisionByZero)
    );

    let unknown = evaluate(&calc, "foo(1)");
    assert_eq!(
        unknown.error(),
        Some(&CalcError::UnknownIdentifier("foo".into()))
    );
    assert!(unknown.to_string().contains("'foo'"));
    assert_eq!(
        unknown.error().map(CalcError::kind),
        Some(ErrorKind::SandboxRejected)
    );
}

#[test]
fn test_currency_notice() {
    let outcome = evaluate(&Calculator::new(), "20 GBP in USD");
    assert!(outcome.is_info());
    assert_eq!(
        outcome.to_string(),
        "Info: Currency conversion via API is planned."
    );
}

#[test]
fn test_missing_symbolic_algebra() {
    let calc = Calculator::new().without(CapabilityKind::SymbolicAlgebra);
    assert!(evaluate(&calc, "2x=4").is_info());
    assert_eq!(calc.phase(CapabilityKind::SymbolicAlgebra), Phase::Notified);
    assert_eq!(
        evaluate(&calc, "3x=9").error(),
        Some(&CalcError::Unsupported(CapabilityKind::SymbolicAlgebra))
    );
    // repeated calls after the transition stay identical
    assert_eq!(evaluate(&calc, "3x=9"), evaluate(&calc, "3x=9"));
}

#[test]
fn test_capability_states_are_independent_per_calculator() {
    let first = Calculator::new().without(CapabilityKind::Statistics);
    let second = Calculator::new().without(CapabilityKind::Statistics);
    assert!(evaluate(&first, "mean 1 2").is_info());
    assert!(evaluate(&second, "mean 1 2").is_info());
}

#[test]
fn test_history_flow() {
    let calc = Calculator::new();
    let mut history = History::new(20);

    for query in ["2x=4", "10/0", "12*3", "255 to hex"] {
        let outcome = evaluate(&calc, query);
        let line = DisplayLine::render(query, &outcome);
        if outcome.is_error() {
            assert_eq!(line.tone, Tone::Error);
        }
        if let Some(entry) = HistoryEntry::from_outcome(query, &outcome, frozen_now()) {
            history.record(entry);
        }
    }

    assert_eq!(
        history.listing(),
        [
            "[2024-01-10 15:45:00] 255 to hex => 0xff",
            "[2024-01-10 15:45:00] 12*3 = 36",
            "[2024-01-10 15:45:00] 2x=4 => x = 2",
        ]
    );

    let equation = history.recent().last().unwrap();
    assert_eq!(equation.to_latex(&calc), "$2x=4 \\Rightarrow x = 2$");
}

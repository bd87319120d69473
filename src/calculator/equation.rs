//! Equation solving: `2x + 1 = 7`, `x^2 = 2`, `√x = 3`.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error};

use super::capability::{ProviderError, SymbolicAlgebra};
use super::outcome::{CalcError, Value};
use super::symbolic::Solution;

lazy_static! {
    /// `√(expr)` or `√token`
    pub(crate) static ref RADICAL: Regex = Regex::new(r"√\s*(\([^)]+\)|[a-z_0-9.]+)").unwrap();
}

/// Lowercase and rewrite radicals and carets into call and `**` form.
pub fn normalize(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    RADICAL.replace_all(&lower, "sqrt($1)").replace('^', "**")
}

/// Solve for `x` and return the first root together with its symbolic handle.
pub fn solve(text: &str, algebra: &dyn SymbolicAlgebra) -> Result<(Value, Solution), CalcError> {
    let normalized = normalize(text);
    let (lhs, rhs) = normalized
        .split_once('=')
        .ok_or_else(|| CalcError::parse("Invalid equation syntax (missing '=')"))?;
    debug!("Equation sides: '{}' = '{}'", lhs.trim(), rhs.trim());

    let solutions = algebra
        .parse_and_solve(lhs, rhs, "x")
        .map_err(|e| match e {
            ProviderError::Parse(msg) => {
                error!("Equation parsing error for '{}': {}", text, msg);
                CalcError::parse(format!("Invalid equation syntax ({msg})"))
            }
            ProviderError::Domain(msg) => {
                error!("Equation solving error for '{}': {}", text, msg);
                CalcError::failed("Equation solving", msg)
            }
        })?;

    let first = solutions.into_iter().next().ok_or(CalcError::NoSolution)?;
    Ok((
        Value::text(format!("x = {}", algebra.format(&first))),
        first,
    ))
}

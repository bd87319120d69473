//! Built-in symbolic-algebra provider.
//!
//! Equations in one variable are parsed into an [`Expr`](expr::Expr) tree and
//! solved for `lhs - rhs = 0`. Polynomials get every root (complex included),
//! other equations get the real roots a bounded numeric scan can find.

mod expr;
mod markup;
pub mod parse;
mod solve;

use tracing::debug;

use super::capability::{ProviderError, SymbolicAlgebra};
use super::format;
use expr::Expr;

/// One root of an equation, kept numerically for re-rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Solution {
    re: f64,
    im: f64,
}

impl Solution {
    pub fn real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn re(&self) -> f64 {
        self.re
    }

    pub fn im(&self) -> f64 {
        self.im
    }

    pub fn is_real(&self) -> bool {
        self.im == 0.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SymbolicEngine;

fn side(text: &str) -> Result<Expr, ProviderError> {
    parse::parse(text.trim()).map_err(ProviderError::Parse)
}

impl SymbolicAlgebra for SymbolicEngine {
    fn parse_and_solve(
        &self,
        lhs: &str,
        rhs: &str,
        variable: &str,
    ) -> Result<Vec<Solution>, ProviderError> {
        if variable != "x" {
            return Err(ProviderError::Domain(format!(
                "cannot solve for '{variable}'"
            )));
        }
        let f = Expr::Sub(Box::new(side(lhs)?), Box::new(side(rhs)?));
        let roots = solve::roots(&f);
        debug!("Solved '{} = {}': {} root(s)", lhs.trim(), rhs.trim(), roots.len());

        Ok(roots
            .into_iter()
            .map(|r| Solution::complex(r.re, r.im))
            .collect())
    }

    /// Real roots use the decimal solution format; complex roots read like
    /// `-1 - 2*I`.
    fn format(&self, solution: &Solution) -> String {
        if solution.is_real() {
            return format::solution(solution.re);
        }
        let im = solution.im.abs();
        let imaginary = if im == 1.0 {
            "I".to_string()
        } else {
            format!("{}*I", format::solution(im))
        };
        match (solution.re == 0.0, solution.im < 0.0) {
            (true, true) => format!("-{imaginary}"),
            (true, false) => imaginary,
            (false, negative) => format!(
                "{} {} {imaginary}",
                format::solution(solution.re),
                if negative { "-" } else { "+" }
            ),
        }
    }

    fn to_markup(&self, solution: &Solution) -> String {
        if solution.is_real() {
            markup::real(solution.re)
        } else {
            markup::complex(solution.re, solution.im)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(lhs: &str, rhs: &str) -> Solution {
        SymbolicEngine.parse_and_solve(lhs, rhs, "x").unwrap()[0]
    }

    #[test]
    fn test_solves_and_formats() {
        let engine = SymbolicEngine;
        assert_eq!(engine.format(&first("2x", "4")), "2");
        assert_eq!(engine.format(&first("x**2", "2")), "-1.414213562");
        assert_eq!(engine.format(&first("3x", "1")), "0.3333333333");
    }

    #[test]
    fn test_complex_format() {
        let engine = SymbolicEngine;
        assert_eq!(engine.format(&first("x**2 + 2x + 5", "0")), "-1 - 2*I");
        assert_eq!(engine.format(&Solution::complex(0.0, 1.0)), "I");
        assert_eq!(engine.format(&Solution::complex(0.0, -2.5)), "-2.5*I");
    }

    #[test]
    fn test_markup() {
        let engine = SymbolicEngine;
        assert_eq!(engine.to_markup(&first("2x", "1")), "\\frac{1}{2}");
        assert_eq!(engine.to_markup(&first("x**2 + 1", "0")), "- i");
    }

    #[test]
    fn test_parse_failure() {
        let err = SymbolicEngine.parse_and_solve("2y", "4", "x").unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[test]
    fn test_identity_has_no_roots() {
        assert!(SymbolicEngine.parse_and_solve("x", "x", "x").unwrap().is_empty());
    }
}

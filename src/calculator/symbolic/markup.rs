//! LaTeX rendering of solutions.

use num_integer::Roots;
use num_rational::Ratio;

use crate::calculator::format;

const MAX_DENOMINATOR: i64 = 1000;

/// Small-denominator fraction equal to `x` up to rounding noise.
fn rational(x: f64) -> Option<Ratio<i64>> {
    if !x.is_finite() || x.abs() > 1e12 {
        return None;
    }
    (1..=MAX_DENOMINATOR).find_map(|q| {
        let p = (x * q as f64).round();
        ((p / q as f64 - x).abs() <= 1e-12 * x.abs().max(1.0)).then(|| Ratio::new(p as i64, q))
    })
}

fn fraction(r: Ratio<i64>) -> String {
    let (p, q) = (*r.numer(), *r.denom());
    let sign = if p < 0 { "- " } else { "" };
    if q == 1 {
        format!("{p}")
    } else {
        format!("{sign}\\frac{{{}}}{{{q}}}", p.abs())
    }
}

/// `k \sqrt{m}` with the largest square factor pulled out of `n`.
fn surd(n: i64) -> String {
    let mut outside = 1;
    let mut inside = n;
    let mut f = 2;
    while f * f <= inside {
        while inside % (f * f) == 0 {
            inside /= f * f;
            outside *= f;
        }
        f += 1;
    }
    if outside == 1 {
        format!("\\sqrt{{{inside}}}")
    } else {
        format!("{outside} \\sqrt{{{inside}}}")
    }
}

/// LaTeX form of a real number.
pub fn real(x: f64) -> String {
    if let Some(r) = rational(x) {
        return fraction(r);
    }
    if let Some(sq) = rational(x * x).filter(|r| r.is_integer() && *r.numer() > 0) {
        let n = *sq.numer();
        if n.sqrt() * n.sqrt() != n {
            let sign = if x < 0.0 { "- " } else { "" };
            return format!("{sign}{}", surd(n));
        }
    }
    format::solution(x)
}

/// LaTeX form of `re + im i`.
pub fn complex(re: f64, im: f64) -> String {
    let imaginary = match im.abs() {
        m if m == 1.0 => "i".to_string(),
        m => format!("{} i", real(m)),
    };
    if re == 0.0 {
        let sign = if im < 0.0 { "- " } else { "" };
        return format!("{sign}{imaginary}");
    }
    let op = if im < 0.0 { "-" } else { "+" };
    format!("{} {op} {imaginary}", real(re))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_and_fractions() {
        assert_eq!(real(3.0), "3");
        assert_eq!(real(-4.0), "-4");
        assert_eq!(real(0.5), "\\frac{1}{2}");
        assert_eq!(real(-2.0 / 3.0), "- \\frac{2}{3}");
    }

    #[test]
    fn test_surds() {
        assert_eq!(real(2f64.sqrt()), "\\sqrt{2}");
        assert_eq!(real(-(8f64.sqrt())), "- 2 \\sqrt{2}");
    }

    #[test]
    fn test_decimal_fallback() {
        assert_eq!(real(std::f64::consts::PI), "3.141592654");
    }

    #[test]
    fn test_complex() {
        assert_eq!(complex(-1.0, -1.0), "-1 - i");
        assert_eq!(complex(0.0, 2.0), "2 i");
        assert_eq!(complex(0.5, 1.5), "\\frac{1}{2} + \\frac{3}{2} i");
    }
}

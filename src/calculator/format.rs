//! Numeric formatting and canonicalization.
//!
//! Every rule here is reproducible bit-for-bit: values are rounded through
//! exact decimal formatting, never through `x * 10^n` arithmetic.

use num_bigint::BigInt;
use num_traits::FromPrimitive;

use super::outcome::{CalcError, Number};

/// Split `x` into (negative, significant digits, decimal exponent) using the
/// shortest representation that round-trips.
fn shortest_digits(x: f64) -> (bool, String, i32) {
    let s = format!("{:e}", x.abs());
    let (mantissa, exp) = s.split_once('e').unwrap_or((&s, "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    (x.is_sign_negative(), digits, exp.parse().unwrap_or(0))
}

fn exponent_suffix(exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("e{sign}{:02}", exp.abs())
}

/// Shortest round-trip text of a float, switching to scientific notation
/// outside `1e-4 <= |x| < 1e16`.
pub fn repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".into();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".into() } else { "-inf".into() };
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0.0".into() } else { "0.0".into() };
    }

    let (neg, digits, exp) = shortest_digits(x);
    let sign = if neg { "-" } else { "" };

    if (-4..16).contains(&exp) {
        let body = if exp >= 0 {
            let point = exp as usize + 1;
            if digits.len() <= point {
                format!("{digits}{}.0", "0".repeat(point - digits.len()))
            } else {
                format!("{}.{}", &digits[..point], &digits[point..])
            }
        } else {
            format!("0.{}{digits}", "0".repeat((-exp - 1) as usize))
        };
        format!("{sign}{body}")
    } else {
        let mantissa = if digits.len() > 1 {
            format!("{}.{}", &digits[..1], &digits[1..])
        } else {
            digits
        };
        format!("{sign}{mantissa}{}", exponent_suffix(exp))
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// General format with `precision` significant digits and trailing zeros removed.
pub fn general(x: f64, precision: usize) -> String {
    if !x.is_finite() {
        return repr(x);
    }
    let precision = precision.max(1);
    if x == 0.0 {
        return if x.is_sign_negative() { "-0".into() } else { "0".into() };
    }

    let sci = format!("{:.*e}", precision - 1, x);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp >= -4 && exp < precision as i32 {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{x:.decimals$}")).to_string()
    } else {
        format!("{}{}", trim_fraction(mantissa), exponent_suffix(exp))
    }
}

/// Scientific format with a fixed number of fractional digits.
pub fn scientific(x: f64, decimals: usize) -> String {
    let sci = format!("{x:.decimals$e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) => {
            format!("{mantissa}{}", exponent_suffix(exp.parse().unwrap_or(0)))
        }
        None => sci,
    }
}

/// Round to `decimals` fractional digits, correctly rounded.
pub fn round_to(x: f64, decimals: usize) -> f64 {
    if !x.is_finite() {
        return x;
    }
    format!("{x:.decimals$}").parse().unwrap_or(x)
}

fn integral(x: f64) -> Option<BigInt> {
    (x.is_finite() && x.fract() == 0.0)
        .then(|| BigInt::from_f64(x))
        .flatten()
}

/// Canonical form of a float result from the arithmetic sandbox.
pub fn canonical_float(x: f64) -> Result<Number, CalcError> {
    if x.is_infinite() {
        return Err(CalcError::Overflow);
    }
    if x.is_nan() {
        return Err(CalcError::failed("Calculation", "not a number"));
    }
    if let Some(n) = integral(x) {
        return Ok(Number::Integer(n));
    }
    for decimals in 1..=10 {
        let rounded = round_to(x, decimals);
        if (x - rounded).abs() < 1e-12 {
            return Ok(Number::Float(rounded));
        }
    }
    Ok(Number::Float(general(x, 12).parse().unwrap_or(x)))
}

fn snap(part: f64) -> f64 {
    let rounded = round_to(part, 12);
    if (part - rounded).abs() < 1e-13 {
        rounded
    } else {
        part
    }
}

/// Canonical form of a complex result; collapses to a real when the
/// imaginary part vanishes after snapping.
pub fn canonical_complex(re: f64, im: f64) -> Result<Number, CalcError> {
    let (re, im) = (snap(re), snap(im));
    if im == 0.0 {
        canonical_float(re)
    } else {
        Ok(Number::Complex { re, im })
    }
}

/// Display text for a complex value with non-zero imaginary part.
pub fn complex(re: f64, im: f64) -> String {
    if re == 0.0 {
        return match im {
            v if v == 1.0 => "j".into(),
            v if v == -1.0 => "-j".into(),
            v => format!("{}j", general(v, 6)),
        };
    }
    let sign = if im >= 0.0 { "+" } else { "" };
    format!("{}{sign}{}j", general(re, 6), general(im, 6))
}

/// Display text for a real root of an equation.
pub fn solution(x: f64) -> String {
    if let Some(n) = integral(x) {
        return n.to_string();
    }
    for decimals in 1..=6 {
        let rounded = round_to(x, decimals);
        if (x - rounded).abs() < 1e-9 {
            // tiny negatives round to -0
            let rounded = if rounded == 0.0 { 0.0 } else { rounded };
            return general(rounded, 10);
        }
    }
    if x.abs() > 1e-7 && x.abs() < 1e7 {
        general(x, 10)
    } else {
        scientific(x, 6)
    }
}

/// Statistics results: integers stay integral, everything else keeps six decimals.
pub fn statistic(x: f64) -> Result<Number, CalcError> {
    if !x.is_finite() {
        return Err(CalcError::Overflow);
    }
    match integral(x) {
        Some(n) => Ok(Number::Integer(n)),
        None => Ok(Number::Float(round_to(x, 6))),
    }
}

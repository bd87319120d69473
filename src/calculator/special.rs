//! Special functions missing from `std`: gamma, log-gamma and the error functions.
//!
//! All return NaN outside their domain; callers decide how to report it.

use std::f64::consts::PI;

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Largest `n` with a finite `n!` in `f64`.
const MAX_FACTORIAL: u32 = 170;

fn is_pole(x: f64) -> bool {
    x <= 0.0 && x.fract() == 0.0
}

/// Lanczos series for `x >= 0.5`, returning `(t, sum)` for the shifted argument.
fn lanczos(x: f64) -> (f64, f64) {
    let x = x - 1.0;
    let sum = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, c)| acc + c / (x + i as f64));
    (x + LANCZOS_G + 0.5, sum)
}

pub fn gamma(x: f64) -> f64 {
    if x.is_nan() || is_pole(x) {
        return f64::NAN;
    }
    if x.fract() == 0.0 && x <= MAX_FACTORIAL as f64 + 1.0 {
        return (1..x as u32).fold(1.0, |acc, k| acc * k as f64);
    }
    if x < 0.5 {
        return PI / ((PI * x).sin() * gamma(1.0 - x));
    }
    let (t, sum) = lanczos(x);
    (2.0 * PI).sqrt() * t.powf(x - 0.5) * (-t).exp() * sum
}

/// `ln |gamma(x)|`.
pub fn lgamma(x: f64) -> f64 {
    if x.is_nan() || is_pole(x) {
        return f64::NAN;
    }
    if x == 1.0 || x == 2.0 {
        return 0.0;
    }
    if x < 0.5 {
        return (PI / (PI * x).sin()).abs().ln() - lgamma(1.0 - x);
    }
    let (t, sum) = lanczos(x);
    0.5 * (2.0 * PI).ln() + (x - 0.5) * t.ln() - t + sum.ln()
}

const SERIES_LIMIT: f64 = 2.5;

fn erf_series(x: f64) -> f64 {
    let x2 = x * x;
    let mut term = x;
    let mut sum = x;
    for n in 1..200 {
        term *= -x2 / n as f64;
        let add = term / (2 * n + 1) as f64;
        sum += add;
        if add.abs() < 1e-17 * sum.abs() {
            break;
        }
    }
    sum * 2.0 / PI.sqrt()
}

/// Continued fraction for `erfc(x)`, `x >= SERIES_LIMIT`.
fn erfc_fraction(x: f64) -> f64 {
    let mut t = x;
    for k in (1..=60).rev() {
        t = x + (k as f64 / 2.0) / t;
    }
    (-x * x).exp() / (PI.sqrt() * t)
}

pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }
    if x.abs() < SERIES_LIMIT {
        erf_series(x)
    } else {
        x.signum() * (1.0 - erfc_fraction(x.abs()))
    }
}

pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }
    if x >= SERIES_LIMIT {
        erfc_fraction(x)
    } else if x <= -SERIES_LIMIT {
        2.0 - erfc_fraction(-x)
    } else {
        1.0 - erf_series(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1.0)
    }

    #[test]
    fn test_gamma_integers_exact() {
        assert_eq!(gamma(1.0), 1.0);
        assert_eq!(gamma(5.0), 24.0);
        assert_eq!(gamma(11.0), 3_628_800.0);
        assert!(gamma(172.0).is_infinite());
    }

    #[test]
    fn test_gamma_fractional() {
        assert!(close(gamma(0.5), PI.sqrt()));
        assert!(close(gamma(1.5), PI.sqrt() / 2.0));
        assert!(close(gamma(-0.5), -2.0 * PI.sqrt()));
    }

    #[test]
    fn test_gamma_poles() {
        assert!(gamma(0.0).is_nan());
        assert!(gamma(-3.0).is_nan());
        assert!(lgamma(-2.0).is_nan());
    }

    #[test]
    fn test_lgamma() {
        assert_eq!(lgamma(1.0), 0.0);
        assert!(close(lgamma(10.0), 362_880f64.ln()));
        assert!(close(lgamma(0.5), PI.sqrt().ln()));
    }

    #[test]
    fn test_erf() {
        assert_eq!(erf(0.0), 0.0);
        assert!(close(erf(1.0), 0.842_700_792_949_714_9));
        assert!(close(erf(-1.0), -0.842_700_792_949_714_9));
        assert!(close(erf(3.0), 0.999_977_909_503_001_4));
        assert!(close(erfc(0.5), 0.479_500_122_186_953_5));
        assert!((erfc(5.0) - 1.537_459_794_428_034_8e-12).abs() < 1e-20);
        assert!(close(erfc(-3.0), 1.999_977_909_503_001_4));
    }
}

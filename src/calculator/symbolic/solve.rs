//! Root finding for `f(x) = 0`.
//!
//! Polynomials (up to [`MAX_DEGREE`]) are solved in closed form through
//! degree two and with Durand-Kerner iteration above that; roots come back
//! real-first in ascending order. Anything else is scanned numerically over
//! a fine window around zero and roots come back nearest-to-zero first.
//! When the window holds no root the scan widens decade by decade out to
//! the edge of the `f64` range.

use num_complex::Complex64;

use super::expr::Expr;

pub const MAX_DEGREE: usize = 16;

const SCAN_HALF_WIDTH: i32 = 10_000;
const SCAN_SCALE: f64 = 100.0;

/// Decades past the fine window searched when it holds no root.
const WIDEN_DECADES: std::ops::Range<i32> = 2..308;
const WIDEN_STEPS: i32 = 64;

/// A root, real when `im == 0`.
pub type Root = Complex64;

/// Coefficients, lowest degree first.
type Poly = Vec<f64>;

fn add(a: &[f64], b: &[f64], sign: f64) -> Poly {
    let mut out = vec![0.0; a.len().max(b.len())];
    for (i, c) in a.iter().enumerate() {
        out[i] += c;
    }
    for (i, c) in b.iter().enumerate() {
        out[i] += sign * c;
    }
    out
}

fn mul(a: &[f64], b: &[f64]) -> Option<Poly> {
    if a.len() + b.len() - 1 > MAX_DEGREE + 1 {
        return None;
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    Some(out)
}

/// Coefficients of `e` if it is a polynomial in `x`.
fn poly(e: &Expr) -> Option<Poly> {
    if !e.has_var() {
        let v = e.eval(0.0);
        return v.is_finite().then(|| vec![v]);
    }
    match e {
        Expr::Var => Some(vec![0.0, 1.0]),
        Expr::Neg(a) => Some(poly(a)?.iter().map(|c| -c).collect()),
        Expr::Add(a, b) => Some(add(&poly(a)?, &poly(b)?, 1.0)),
        Expr::Sub(a, b) => Some(add(&poly(a)?, &poly(b)?, -1.0)),
        Expr::Mul(a, b) => mul(&poly(a)?, &poly(b)?),
        Expr::Div(a, b) if !b.has_var() => {
            let d = b.eval(0.0);
            if d == 0.0 || !d.is_finite() {
                return None;
            }
            Some(poly(a)?.iter().map(|c| c / d).collect())
        }
        Expr::Pow(a, b) if !b.has_var() => {
            let n = b.eval(0.0);
            if n.fract() != 0.0 || n < 0.0 || n > MAX_DEGREE as f64 {
                return None;
            }
            let base = poly(a)?;
            let mut acc = vec![1.0];
            for _ in 0..n as usize {
                acc = mul(&acc, &base)?;
            }
            Some(acc)
        }
        _ => None,
    }
}

fn trim(mut p: Poly) -> Poly {
    let scale = p.iter().fold(0.0f64, |m, c| m.max(c.abs()));
    let eps = 1e-12 * scale;
    while p.len() > 1 && p.last().is_some_and(|c| c.abs() <= eps) {
        p.pop();
    }
    p
}

fn linear(p: &[f64]) -> Vec<Root> {
    vec![Root::new(-p[0] / p[1], 0.0)]
}

fn quadratic(p: &[f64]) -> Vec<Root> {
    let (c, b, a) = (p[0], p[1], p[2]);
    let disc = b * b - 4.0 * a * c;

    if disc.abs() <= 1e-12 * (b * b + (4.0 * a * c).abs()) {
        return vec![Root::new(-b / (2.0 * a), 0.0)];
    }
    if disc > 0.0 {
        let sign = if b >= 0.0 { 1.0 } else { -1.0 };
        let q = -0.5 * (b + sign * disc.sqrt());
        let mut roots = [q / a, c / q];
        roots.sort_by(f64::total_cmp);
        return roots.iter().map(|r| Root::new(*r, 0.0)).collect();
    }
    let re = -b / (2.0 * a);
    let im = (-disc).sqrt() / (2.0 * a.abs());
    vec![Root::new(re, -im), Root::new(re, im)]
}

fn horner(p: &[f64], z: Complex64) -> Complex64 {
    p.iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + c)
}

fn horner_real(p: &[f64], x: f64) -> (f64, f64) {
    let mut value = 0.0;
    let mut slope = 0.0;
    for c in p.iter().rev() {
        slope = slope * x + value;
        value = value * x + c;
    }
    (value, slope)
}

/// Durand-Kerner iteration on the monic form of `p`.
fn durand_kerner(p: &[f64]) -> Vec<Root> {
    let lead = p[p.len() - 1];
    let monic: Poly = p.iter().map(|c| c / lead).collect();
    let n = monic.len() - 1;
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..n).map(|k| seed.powu(k as u32)).collect();

    for _ in 0..1000 {
        let mut shift = 0.0f64;
        for k in 0..n {
            let denom = (0..n)
                .filter(|j| *j != k)
                .fold(Complex64::new(1.0, 0.0), |acc, j| acc * (roots[k] - roots[j]));
            if denom.norm() == 0.0 {
                continue;
            }
            let delta = horner(&monic, roots[k]) / denom;
            roots[k] -= delta;
            shift = shift.max(delta.norm());
        }
        if shift < 1e-15 {
            break;
        }
    }

    let mut out: Vec<Root> = Vec::with_capacity(n);
    for z in roots {
        let root = if z.im.abs() < 1e-7 * (1.0 + z.re.abs()) {
            let mut x = z.re;
            for _ in 0..50 {
                let (v, d) = horner_real(p, x);
                if d == 0.0 || v == 0.0 {
                    break;
                }
                x -= v / d;
            }
            Root::new(x, 0.0)
        } else {
            z
        };
        if !out.iter().any(|r| (*r - root).norm() < 1e-6 * (1.0 + root.norm())) {
            out.push(root);
        }
    }

    out.sort_by(|a, b| {
        let a_real = a.im == 0.0;
        let b_real = b.im == 0.0;
        b_real
            .cmp(&a_real)
            .then(a.re.total_cmp(&b.re))
            .then(a.im.total_cmp(&b.im))
    });
    out
}

fn polynomial_roots(p: Poly) -> Vec<Root> {
    let p = trim(p);
    match p.len() {
        0 | 1 => Vec::new(),
        2 => linear(&p),
        3 => quadratic(&p),
        _ => durand_kerner(&p),
    }
}

fn bisect(f: &dyn Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    let mut f_lo = f(lo);
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mid == lo || mid == hi {
            break;
        }
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return mid;
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Minimize |f| on [lo, hi] by ternary search; used for roots that touch zero
/// without crossing it.
fn touch(f: &dyn Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    for _ in 0..200 {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if f(m1).abs() <= f(m2).abs() {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    0.5 * (lo + hi)
}

/// Numeric roots of a non-polynomial `e`, nearest to zero first.
fn scan_roots(e: &Expr) -> Vec<Root> {
    let f = |x: f64| e.eval(x);
    let xs: Vec<f64> = (-SCAN_HALF_WIDTH..=SCAN_HALF_WIDTH)
        .map(|i| i as f64 / SCAN_SCALE)
        .collect();
    let ys: Vec<f64> = xs.iter().map(|x| f(*x)).collect();
    let mut found: Vec<f64> = Vec::new();

    for i in 0..xs.len() {
        let y = ys[i];
        if y == 0.0 {
            found.push(xs[i]);
            continue;
        }
        if i == 0 || !y.is_finite() {
            continue;
        }
        let prev = ys[i - 1];
        if prev.is_finite() && prev != 0.0 && prev.signum() != y.signum() {
            let r = bisect(&f, xs[i - 1], xs[i]);
            if f(r).abs() < 1e-8 {
                found.push(r);
            }
        } else if i + 1 < xs.len() {
            let next = ys[i + 1];
            let dips = y.abs() < prev.abs() && y.abs() < next.abs() && y.abs() < 1e-2;
            if dips && next.signum() == y.signum() {
                let r = touch(&f, xs[i - 1], xs[i + 1]);
                if f(r).abs() < 1e-10 {
                    found.push(r);
                }
            }
        }
    }

    let mut unique: Vec<f64> = Vec::new();
    for r in found {
        if !unique.iter().any(|u| (u - r).abs() < 1e-6) {
            unique.push(r);
        }
    }
    unique.sort_by(|a, b| a.abs().total_cmp(&b.abs()).then(a.total_cmp(b)));
    unique.into_iter().map(|r| Root::new(r, 0.0)).collect()
}

/// Geometric scan outward from the fine window, one side at a time.
fn widen_roots(e: &Expr) -> Vec<Root> {
    let f = |x: f64| e.eval(x);
    let mut found: Vec<f64> = Vec::new();

    for side in [1.0, -1.0] {
        let start = side * 10f64.powi(WIDEN_DECADES.start);
        let (mut prev_x, mut prev_y) = (start, f(start));
        for step in WIDEN_DECADES.start * WIDEN_STEPS + 1..=WIDEN_DECADES.end * WIDEN_STEPS {
            let x = side * 10f64.powf(f64::from(step) / f64::from(WIDEN_STEPS));
            let y = f(x);
            // exact zeros this far out are usually underflow, so only
            // sign changes count
            if y == 0.0 {
                continue;
            }
            if y.is_finite() && prev_y.is_finite() && prev_y != 0.0 && prev_y.signum() != y.signum() {
                let r = bisect(&f, prev_x, x);
                let residual = f(r).abs();
                // a pole also flips sign but blows up at the midpoint
                if residual < 1e-8 || residual <= 1e-6 * prev_y.abs().max(y.abs()) {
                    found.push(r);
                }
            }
            (prev_x, prev_y) = (x, y);
        }
    }

    found.sort_by(|a, b| a.abs().total_cmp(&b.abs()).then(a.total_cmp(b)));
    found.into_iter().map(|r| Root::new(r, 0.0)).collect()
}

/// All roots found for `f(x) = 0`, in solver order.
pub fn roots(f: &Expr) -> Vec<Root> {
    match poly(f) {
        Some(p) => polynomial_roots(p),
        None => {
            let near = scan_roots(f);
            if near.is_empty() { widen_roots(f) } else { near }
        }
    }
}

//! The closed symbol table of the arithmetic sandbox.
//!
//! Every name an expression can reach is listed in [`lookup`]; there is no
//! other way to obtain a value or call a function.

use std::f64::consts::{E, PI};

use num_bigint::BigInt;
use num_complex::Complex64;
use num_integer::Integer;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};

use super::value::{BinOp, MAX_INT_BITS, Num, Object, checked_int, int_to_f64, math_domain};
use crate::calculator::outcome::CalcError;
use crate::calculator::special;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    // math
    Fabs,
    Factorial,
    Gamma,
    Lgamma,
    Sqrt,
    Cbrt,
    Exp,
    Expm1,
    Log,
    Log10,
    Log2,
    Log1p,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Radians,
    Degrees,
    Hypot,
    Floor,
    Ceil,
    Trunc,
    Modf,
    Erf,
    Erfc,
    Gcd,
    Lcm,
    // primitive constructors
    Pow,
    Round,
    Min,
    Max,
    Len,
    Sum,
    Float,
    Int,
    Str,
    Complex,
    Divmod,
}

/// Name, entry. `abs` is the `math` module's float absolute value.
const FUNCTIONS: &[(&str, Builtin)] = &[
    ("abs", Builtin::Fabs),
    ("factorial", Builtin::Factorial),
    ("gamma", Builtin::Gamma),
    ("lgamma", Builtin::Lgamma),
    ("sqrt", Builtin::Sqrt),
    ("cbrt", Builtin::Cbrt),
    ("exp", Builtin::Exp),
    ("expm1", Builtin::Expm1),
    ("log", Builtin::Log),
    ("log10", Builtin::Log10),
    ("log2", Builtin::Log2),
    ("log1p", Builtin::Log1p),
    ("sin", Builtin::Sin),
    ("cos", Builtin::Cos),
    ("tan", Builtin::Tan),
    ("asin", Builtin::Asin),
    ("acos", Builtin::Acos),
    ("atan", Builtin::Atan),
    ("atan2", Builtin::Atan2),
    ("sinh", Builtin::Sinh),
    ("cosh", Builtin::Cosh),
    ("tanh", Builtin::Tanh),
    ("asinh", Builtin::Asinh),
    ("acosh", Builtin::Acosh),
    ("atanh", Builtin::Atanh),
    ("rad", Builtin::Radians),
    ("deg", Builtin::Degrees),
    ("pow", Builtin::Pow),
    ("hypot", Builtin::Hypot),
    ("floor", Builtin::Floor),
    ("ceil", Builtin::Ceil),
    ("trunc", Builtin::Trunc),
    ("modf", Builtin::Modf),
    ("erf", Builtin::Erf),
    ("erfc", Builtin::Erfc),
    ("gcd", Builtin::Gcd),
    ("lcm", Builtin::Lcm),
    ("round", Builtin::Round),
    ("min", Builtin::Min),
    ("max", Builtin::Max),
    ("len", Builtin::Len),
    ("sum", Builtin::Sum),
    ("float", Builtin::Float),
    ("int", Builtin::Int),
    ("str", Builtin::Str),
    ("complex", Builtin::Complex),
    ("divmod", Builtin::Divmod),
];

/// Resolve a name against the fixed table.
pub fn lookup(name: &str) -> Option<Object> {
    match name {
        "pi" => Some(Object::Float(PI)),
        "e" => Some(Object::Float(E)),
        "true" => Some(Object::Bool(true)),
        "false" => Some(Object::Bool(false)),
        "none" => Some(Object::None),
        _ => FUNCTIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, b)| Object::Function(*b)),
    }
}

pub fn names() -> impl Iterator<Item = &'static str> {
    ["pi", "e", "true", "false", "none"]
        .into_iter()
        .chain(FUNCTIONS.iter().map(|(n, _)| *n))
}

fn arity_error(name: &str, expected: &str, given: usize) -> CalcError {
    CalcError::type_error(format!("{name}() takes {expected} ({given} given)"))
}

fn exactly<'a, const N: usize>(name: &str, args: &'a [Object]) -> Result<&'a [Object; N], CalcError> {
    args.try_into().map_err(|_| {
        let expected = match N {
            1 => "exactly one argument".to_string(),
            n => format!("exactly {n} arguments"),
        };
        arity_error(name, &expected, args.len())
    })
}

/// Result of a real-valued `math` function: NaN is a domain error, an
/// infinity from finite input is an overflow.
fn real_result(input: &[f64], value: f64) -> Result<Object, CalcError> {
    if value.is_nan() && !input.iter().any(|x| x.is_nan()) {
        return Err(math_domain());
    }
    if value.is_infinite() && input.iter().all(|x| x.is_finite()) {
        return Err(CalcError::Overflow);
    }
    Ok(Object::Float(value))
}

fn unary_real(
    name: &str,
    args: &[Object],
    domain: impl Fn(f64) -> bool,
    f: impl Fn(f64) -> f64,
) -> Result<Object, CalcError> {
    let [x] = exactly::<1>(name, args)?;
    let x = x.to_real()?;
    if !domain(x) {
        return Err(math_domain());
    }
    real_result(&[x], f(x))
}

fn any(_: f64) -> bool {
    true
}

/// `ln(n)` for integers too wide for `f64`.
fn big_ln(n: &BigInt) -> Result<f64, CalcError> {
    if !n.is_positive() {
        return Err(math_domain());
    }
    match n.to_f64().filter(|x| x.is_finite()) {
        Some(x) => Ok(x.ln()),
        None => {
            let shift = n.bits() - 64;
            let top = int_to_f64(&(n >> shift))?;
            Ok(top.ln() + shift as f64 * std::f64::consts::LN_2)
        }
    }
}

fn ln_of(name: &str, x: &Object) -> Result<f64, CalcError> {
    match x {
        Object::Int(n) => big_ln(n),
        other => {
            let v = other.to_real().map_err(|e| match e {
                CalcError::Type(_) => CalcError::type_error(format!(
                    "{name}() argument must be real, not {}",
                    other.type_name()
                )),
                e => e,
            })?;
            if v <= 0.0 {
                return Err(math_domain());
            }
            Ok(v.ln())
        }
    }
}

fn log(args: &[Object]) -> Result<Object, CalcError> {
    match args {
        [x] => Ok(Object::Float(ln_of("log", x)?)),
        [x, base] => {
            let den = ln_of("log", base)?;
            if den == 0.0 {
                return Err(CalcError::DivisionByZero);
            }
            Ok(Object::Float(ln_of("log", x)? / den))
        }
        _ => Err(arity_error("log", "1 or 2 arguments", args.len())),
    }
}

fn log_base(name: &str, args: &[Object], base: f64) -> Result<Object, CalcError> {
    let [x] = exactly::<1>(name, args)?;
    let value = ln_of(name, x)? / base.ln();
    // exact powers of the base come out integral
    let rounded = value.round();
    if (value - rounded).abs() < 1e-12 {
        if let Object::Int(n) = x {
            let base_int = BigInt::from(base as u32);
            if rounded >= 0.0 && num_traits::pow(base_int, rounded as usize) == *n {
                return Ok(Object::Float(rounded));
            }
        }
    }
    Ok(Object::Float(value))
}

fn float_to_int(x: f64) -> Result<Object, CalcError> {
    if x.is_infinite() {
        return Err(CalcError::Overflow);
    }
    if x.is_nan() {
        return Err(CalcError::failed("Calculation", "cannot convert float NaN to integer"));
    }
    BigInt::from_f64(x)
        .ok_or(CalcError::Overflow)
        .and_then(checked_int)
}

fn rounding(name: &str, args: &[Object], f: fn(f64) -> f64) -> Result<Object, CalcError> {
    let [x] = exactly::<1>(name, args)?;
    match x.num() {
        Some(Num::Int(n)) => Ok(Object::Int(n)),
        _ => float_to_int(f(x.to_real()?)),
    }
}

fn factorial(args: &[Object]) -> Result<Object, CalcError> {
    let [x] = exactly::<1>("factorial", args)?;
    let n = x.to_int()?;
    if n.is_negative() {
        return Err(CalcError::failed(
            "Calculation",
            "factorial() not defined for negative values",
        ));
    }
    let n = n.to_u64().ok_or(CalcError::Overflow)?;
    let mut acc = BigInt::one();
    for k in 2..=n {
        acc *= k;
        if acc.bits() > MAX_INT_BITS {
            return Err(CalcError::Overflow);
        }
    }
    Ok(Object::Int(acc))
}

fn gcd_all(args: &[Object]) -> Result<Object, CalcError> {
    let mut acc = BigInt::zero();
    for a in args {
        acc = acc.gcd(&a.to_int()?);
    }
    Ok(Object::Int(acc))
}

fn lcm_all(args: &[Object]) -> Result<Object, CalcError> {
    let mut acc = BigInt::one();
    for a in args {
        let n = a.to_int()?;
        if n.is_zero() || acc.is_zero() {
            acc = BigInt::zero();
            continue;
        }
        acc = acc.lcm(&n);
        if acc.bits() > MAX_INT_BITS {
            return Err(CalcError::Overflow);
        }
    }
    Ok(Object::Int(acc))
}

fn pow(args: &[Object]) -> Result<Object, CalcError> {
    match args {
        [base, exp] => base.binary(BinOp::Pow, exp),
        [base, exp, modulus] => {
            let (b, e, m) = (base.to_int()?, exp.to_int()?, modulus.to_int()?);
            if m.is_zero() {
                return Err(CalcError::failed("Calculation", "pow() 3rd argument cannot be 0"));
            }
            let b = if e.is_negative() {
                let egcd = b.mod_floor(&m).extended_gcd(&m);
                if !egcd.gcd.abs().is_one() {
                    return Err(CalcError::failed(
                        "Calculation",
                        "base is not invertible for the given modulus",
                    ));
                }
                egcd.x
            } else {
                b
            };
            let r = b.modpow(&e.abs(), &m.abs());
            // the result carries the modulus' sign, as with `%`
            let r = if m.is_negative() && !r.is_zero() { r + &m } else { r };
            Ok(Object::Int(r))
        }
        _ => Err(arity_error("pow", "2 or 3 arguments", args.len())),
    }
}

/// Round half to even at `10^-digits`.
fn round_int(n: &BigInt, digits: i64) -> Result<Object, CalcError> {
    if digits >= 0 {
        return Ok(Object::Int(n.clone()));
    }
    let places = u32::try_from(-digits).map_err(|_| CalcError::Overflow)?;
    if u64::from(places) > MAX_INT_BITS {
        return Ok(Object::Int(BigInt::zero()));
    }
    let unit = num_traits::pow(BigInt::from(10), places as usize);
    let (q, r) = n.div_mod_floor(&unit);
    let twice: BigInt = &r * 2;
    let q = match twice.cmp(&unit) {
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal if q.is_odd() => q + 1,
        _ => q,
    };
    checked_int(q * unit)
}

fn round(args: &[Object]) -> Result<Object, CalcError> {
    let (x, digits) = match args {
        [x] => (x, None),
        [x, Object::None] => (x, None),
        [x, d] => (x, Some(d.to_int()?.to_i64().ok_or(CalcError::Overflow)?)),
        _ => return Err(arity_error("round", "1 or 2 arguments", args.len())),
    };
    match (x.num(), digits) {
        (Some(Num::Int(n)), Some(d)) => round_int(&n, d),
        (Some(Num::Int(n)), None) => Ok(Object::Int(n)),
        (Some(Num::Float(v)), None) => float_to_int(v.round_ties_even()),
        (Some(Num::Float(v)), Some(_)) if !v.is_finite() => Ok(Object::Float(v)),
        (Some(Num::Float(v)), Some(d)) if d >= 0 => {
            let d = d.min(340) as usize;
            Ok(Object::Float(format!("{v:.d$}").parse().unwrap_or(v)))
        }
        (Some(Num::Float(v)), Some(d)) => {
            let unit = 10f64.powi(d.unsigned_abs().min(400) as i32);
            if unit.is_infinite() {
                return Ok(Object::Float(0f64.copysign(v)));
            }
            Ok(Object::Float((v / unit).round_ties_even() * unit))
        }
        _ => Err(CalcError::type_error(format!(
            "type {} doesn't define __round__ method",
            x.type_name()
        ))),
    }
}

/// Arguments of `min`/`max`/`sum`: a single tuple is iterated.
fn items<'a>(name: &str, args: &'a [Object]) -> Result<&'a [Object], CalcError> {
    match args {
        [Object::Tuple(items)] => Ok(items),
        [single] => Err(CalcError::type_error(format!(
            "'{}' object is not iterable",
            single.type_name()
        ))),
        [] => Err(arity_error(name, "at least 1 argument", 0)),
        many => Ok(many),
    }
}

fn extreme(name: &str, args: &[Object], keep: std::cmp::Ordering) -> Result<Object, CalcError> {
    let values = items(name, args)?;
    let (first, rest) = values.split_first().ok_or_else(|| {
        CalcError::failed("Calculation", format!("{name}() arg is an empty sequence"))
    })?;
    let mut best = first;
    for candidate in rest {
        if candidate.compare(best)? == keep {
            best = candidate;
        }
    }
    Ok(best.clone())
}

fn sum(args: &[Object]) -> Result<Object, CalcError> {
    let (iterable, start) = match args {
        [iterable] => (iterable, Object::Int(BigInt::zero())),
        [iterable, start] => (iterable, start.clone()),
        _ => return Err(arity_error("sum", "1 or 2 arguments", args.len())),
    };
    let Object::Tuple(values) = iterable else {
        return Err(CalcError::type_error(format!(
            "'{}' object is not iterable",
            iterable.type_name()
        )));
    };
    if matches!(start, Object::Str(_)) || values.iter().any(|v| matches!(v, Object::Str(_))) {
        return Err(CalcError::type_error("sum() can't sum strings"));
    }
    values.iter().try_fold(start, |acc, v| acc.binary(BinOp::Add, v))
}

fn len(args: &[Object]) -> Result<Object, CalcError> {
    let [x] = exactly::<1>("len", args)?;
    let n = match x {
        Object::Str(s) => s.chars().count(),
        Object::Tuple(items) => items.len(),
        other => {
            return Err(CalcError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    Ok(Object::Int(BigInt::from(n)))
}

fn parse_float_text(s: &str) -> Option<f64> {
    let t = s.trim().to_lowercase();
    match t.trim_start_matches(['+', '-']) {
        "inf" | "infinity" | "nan" => t.parse().ok(),
        body if body.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | '+' | '-')) => {
            t.parse().ok()
        }
        _ => None,
    }
}

fn float(args: &[Object]) -> Result<Object, CalcError> {
    match args {
        [] => Ok(Object::Float(0.0)),
        [Object::Str(s)] => parse_float_text(s).map(Object::Float).ok_or_else(|| {
            CalcError::failed("Calculation", format!("could not convert string to float: '{s}'"))
        }),
        [x] => Ok(Object::Float(x.to_real().map_err(|_| {
            CalcError::type_error(format!(
                "float() argument must be a string or a real number, not '{}'",
                x.type_name()
            ))
        })?)),
        _ => Err(arity_error("float", "at most 1 argument", args.len())),
    }
}

fn int_from_text(s: &str, base: u32) -> Result<Object, CalcError> {
    let invalid = || {
        CalcError::failed(
            "Calculation",
            format!("invalid literal for int() with base {base}: '{s}'"),
        )
    };
    let t = s.trim().to_lowercase();
    let (negative, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(&t)),
    };
    let (radix, digits) = match (base, body.get(..2)) {
        (0 | 16, Some("0x")) => (16, &body[2..]),
        (0 | 2, Some("0b")) => (2, &body[2..]),
        (0 | 8, Some("0o")) => (8, &body[2..]),
        (0, _) => (10, body),
        (b, _) => (b, body),
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(invalid());
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let n = BigInt::parse_bytes(cleaned.as_bytes(), radix).ok_or_else(invalid)?;
    checked_int(if negative { -n } else { n })
}

fn int(args: &[Object]) -> Result<Object, CalcError> {
    match args {
        [] => Ok(Object::Int(BigInt::zero())),
        [Object::Str(s)] => int_from_text(s, 10),
        [Object::Str(s), base] => {
            let base = base.to_int()?.to_u32().filter(|b| *b == 0 || (2..=36).contains(b));
            let base = base.ok_or_else(|| {
                CalcError::failed("Calculation", "int() base must be >= 2 and <= 36, or 0")
            })?;
            int_from_text(s, base)
        }
        [x] => match x.num() {
            Some(Num::Int(n)) => Ok(Object::Int(n)),
            Some(Num::Float(v)) => float_to_int(v.trunc()),
            _ => Err(CalcError::type_error(format!(
                "int() argument must be a string or a real number, not '{}'",
                x.type_name()
            ))),
        },
        [_, _] => Err(CalcError::type_error("int() can't convert non-string with explicit base")),
        _ => Err(arity_error("int", "at most 2 arguments", args.len())),
    }
}

fn complex_part(x: &Object) -> Result<Complex64, CalcError> {
    match x.num() {
        Some(Num::Complex(z)) => Ok(z),
        Some(_) => Ok(Complex64::new(x.to_real()?, 0.0)),
        None => Err(CalcError::type_error(format!(
            "complex() argument must be a string or a number, not '{}'",
            x.type_name()
        ))),
    }
}

fn complex_from_text(s: &str) -> Result<Complex64, CalcError> {
    let t: String = s.trim().to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
    let malformed = || CalcError::failed("Calculation", "complex() arg is a malformed string");
    let imaginary = |body: &str| -> Result<f64, CalcError> {
        match body {
            "" | "+" => Ok(1.0),
            "-" => Ok(-1.0),
            b => b.parse().map_err(|_| malformed()),
        }
    };
    let Some(body) = t.strip_suffix('j') else {
        return t.parse().map(|re| Complex64::new(re, 0.0)).map_err(|_| malformed());
    };
    // split at the last sign that is not part of an exponent
    let split = body
        .char_indices()
        .filter(|(i, c)| (*c == '+' || *c == '-') && *i > 0 && !body[..*i].ends_with('e'))
        .map(|(i, _)| i)
        .last();
    match split {
        Some(i) => {
            let re: f64 = body[..i].parse().map_err(|_| malformed())?;
            Ok(Complex64::new(re, imaginary(&body[i..])?))
        }
        None => Ok(Complex64::new(0.0, imaginary(body)?)),
    }
}

fn complex(args: &[Object]) -> Result<Object, CalcError> {
    let z = match args {
        [] => Complex64::new(0.0, 0.0),
        [Object::Str(s)] => complex_from_text(s)?,
        [re] => complex_part(re)?,
        [re, im] => complex_part(re)? + complex_part(im)? * Complex64::new(0.0, 1.0),
        _ => return Err(arity_error("complex", "at most 2 arguments", args.len())),
    };
    Ok(Object::Complex(z))
}

fn divmod(args: &[Object]) -> Result<Object, CalcError> {
    let [a, b] = exactly::<2>("divmod", args)?;
    Ok(Object::Tuple(vec![
        a.binary(BinOp::FloorDiv, b)?,
        a.binary(BinOp::Mod, b)?,
    ]))
}

fn hypot(args: &[Object]) -> Result<Object, CalcError> {
    let values = args
        .iter()
        .map(Object::to_real)
        .collect::<Result<Vec<f64>, _>>()?;
    let value = values.iter().fold(0.0f64, |acc, v| acc.hypot(*v));
    real_result(&values, value)
}

fn atan2(args: &[Object]) -> Result<Object, CalcError> {
    let [y, x] = exactly::<2>("atan2", args)?;
    let (y, x) = (y.to_real()?, x.to_real()?);
    real_result(&[y, x], y.atan2(x))
}

fn modf(args: &[Object]) -> Result<Object, CalcError> {
    let [x] = exactly::<1>("modf", args)?;
    let x = x.to_real()?;
    let whole = x.trunc();
    let frac = if x.is_infinite() { 0.0f64.copysign(x) } else { x - whole };
    Ok(Object::Tuple(vec![Object::Float(frac), Object::Float(whole)]))
}

impl Builtin {
    pub fn name(self) -> &'static str {
        FUNCTIONS
            .iter()
            .find(|(_, b)| *b == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }

    pub fn call(self, args: &[Object]) -> Result<Object, CalcError> {
        let name = self.name();
        match self {
            Self::Fabs => unary_real(name, args, any, f64::abs),
            Self::Factorial => factorial(args),
            Self::Gamma => unary_real(name, args, any, special::gamma),
            Self::Lgamma => unary_real(name, args, any, special::lgamma),
            Self::Sqrt => unary_real(name, args, |x| x >= 0.0, f64::sqrt),
            Self::Cbrt => unary_real(name, args, any, f64::cbrt),
            Self::Exp => unary_real(name, args, any, f64::exp),
            Self::Expm1 => unary_real(name, args, any, f64::exp_m1),
            Self::Log => log(args),
            Self::Log10 => log_base(name, args, 10.0),
            Self::Log2 => log_base(name, args, 2.0),
            Self::Log1p => unary_real(name, args, |x| x > -1.0, f64::ln_1p),
            Self::Sin => unary_real(name, args, f64::is_finite, f64::sin),
            Self::Cos => unary_real(name, args, f64::is_finite, f64::cos),
            Self::Tan => unary_real(name, args, f64::is_finite, f64::tan),
            Self::Asin => unary_real(name, args, |x| (-1.0..=1.0).contains(&x), f64::asin),
            Self::Acos => unary_real(name, args, |x| (-1.0..=1.0).contains(&x), f64::acos),
            Self::Atan => unary_real(name, args, any, f64::atan),
            Self::Atan2 => atan2(args),
            Self::Sinh => unary_real(name, args, any, f64::sinh),
            Self::Cosh => unary_real(name, args, any, f64::cosh),
            Self::Tanh => unary_real(name, args, any, f64::tanh),
            Self::Asinh => unary_real(name, args, any, f64::asinh),
            Self::Acosh => unary_real(name, args, |x| x >= 1.0, f64::acosh),
            Self::Atanh => unary_real(name, args, |x| x > -1.0 && x < 1.0, f64::atanh),
            Self::Radians => unary_real(name, args, any, f64::to_radians),
            Self::Degrees => unary_real(name, args, any, f64::to_degrees),
            Self::Hypot => hypot(args),
            Self::Floor => rounding(name, args, f64::floor),
            Self::Ceil => rounding(name, args, f64::ceil),
            Self::Trunc => rounding(name, args, f64::trunc),
            Self::Modf => modf(args),
            Self::Erf => unary_real(name, args, any, special::erf),
            Self::Erfc => unary_real(name, args, any, special::erfc),
            Self::Gcd => gcd_all(args),
            Self::Lcm => lcm_all(args),
            Self::Pow => pow(args),
            Self::Round => round(args),
            Self::Min => extreme(name, args, std::cmp::Ordering::Less),
            Self::Max => extreme(name, args, std::cmp::Ordering::Greater),
            Self::Len => len(args),
            Self::Sum => sum(args),
            Self::Float => float(args),
            Self::Int => int(args),
            Self::Str => {
                let [x] = exactly::<1>(name, args)?;
                Ok(Object::Str(x.render()?))
            }
            Self::Complex => complex(args),
            Self::Divmod => divmod(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Object>) -> Result<Object, CalcError> {
        match lookup(name) {
            Some(Object::Function(b)) => b.call(&args),
            other => panic!("{name} is not a function: {other:?}"),
        }
    }

    fn int(n: i64) -> Object {
        Object::Int(BigInt::from(n))
    }

    #[test]
    fn test_table_is_closed() {
        assert!(lookup("__import__").is_none());
        assert!(lookup("eval").is_none());
        assert!(lookup("open").is_none());
        assert!(lookup("print").is_none());
        assert_eq!(names().count(), FUNCTIONS.len() + 5);
    }

    #[test]
    fn test_abs_is_fabs() {
        assert_eq!(call("abs", vec![int(-3)]), Ok(Object::Float(3.0)));
        assert!(matches!(
            call("abs", vec![Object::Complex(Complex64::new(3.0, 4.0))]),
            Err(CalcError::Type(_))
        ));
    }

    #[test]
    fn test_domain_errors() {
        assert_eq!(call("sqrt", vec![int(-1)]), Err(math_domain()));
        assert_eq!(call("log", vec![int(0)]), Err(math_domain()));
        assert_eq!(call("acos", vec![int(2)]), Err(math_domain()));
        assert_eq!(call("gamma", vec![int(0)]), Err(math_domain()));
        assert_eq!(call("exp", vec![int(1000)]), Err(CalcError::Overflow));
    }

    #[test]
    fn test_logs() {
        assert_eq!(call("log10", vec![int(1000)]), Ok(Object::Float(3.0)));
        assert_eq!(call("log2", vec![int(1024)]), Ok(Object::Float(10.0)));
        match call("log", vec![int(8), int(2)]) {
            Ok(Object::Float(v)) => assert!((v - 3.0).abs() < 1e-12),
            other => panic!("unexpected {other:?}"),
        }
        let huge = Object::Int(num_traits::pow(BigInt::from(10), 400));
        match call("log10", vec![huge]) {
            Ok(Object::Float(v)) => assert!((v - 400.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_integer_functions() {
        assert_eq!(call("factorial", vec![int(5)]), Ok(int(120)));
        assert!(matches!(call("factorial", vec![Object::Float(5.5)]), Err(CalcError::Type(_))));
        assert_eq!(call("factorial", vec![int(100_000)]), Err(CalcError::Overflow));
        assert_eq!(call("gcd", vec![int(12), int(18)]), Ok(int(6)));
        assert_eq!(call("lcm", vec![int(4), int(6)]), Ok(int(12)));
        assert_eq!(call("floor", vec![Object::Float(-2.5)]), Ok(int(-3)));
        assert_eq!(call("ceil", vec![Object::Float(2.1)]), Ok(int(3)));
    }

    #[test]
    fn test_pow() {
        assert_eq!(call("pow", vec![int(2), int(10)]), Ok(int(1024)));
        assert_eq!(call("pow", vec![int(3), int(4), int(5)]), Ok(int(1)));
        assert_eq!(call("pow", vec![int(3), int(-1), int(7)]), Ok(int(5)));
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(call("round", vec![Object::Float(2.5)]), Ok(int(2)));
        assert_eq!(call("round", vec![Object::Float(3.5)]), Ok(int(4)));
        assert_eq!(call("round", vec![Object::Float(3.14159), int(2)]), Ok(Object::Float(3.14)));
        assert_eq!(call("round", vec![int(1250), int(-2)]), Ok(int(1200)));
        assert_eq!(call("round", vec![Object::Float(1.5), int(-400)]), Ok(Object::Float(0.0)));
        assert!(matches!(
            call("round", vec![Object::Float(-1.5), int(-400)]),
            Ok(Object::Float(z)) if z == 0.0 && z.is_sign_negative()
        ));
    }

    #[test]
    fn test_sequences() {
        let t = Object::Tuple(vec![int(3), int(1), int(2)]);
        assert_eq!(call("min", vec![t.clone()]), Ok(int(1)));
        assert_eq!(call("max", vec![int(3), Object::Float(4.5)]), Ok(Object::Float(4.5)));
        assert_eq!(call("sum", vec![t.clone()]), Ok(int(6)));
        assert_eq!(call("len", vec![t]), Ok(int(3)));
        assert!(call("max", vec![Object::Tuple(vec![])]).is_err());
    }

    #[test]
    fn test_constructors() {
        assert_eq!(call("int", vec![Object::Float(-2.7)]), Ok(int(-2)));
        assert_eq!(call("int", vec![Object::Str("ff".into()), int(16)]), Ok(int(255)));
        assert_eq!(call("float", vec![Object::Str(" 1e3 ".into())]), Ok(Object::Float(1000.0)));
        assert_eq!(call("str", vec![int(42)]), Ok(Object::Str("42".into())));
        assert_eq!(
            call("complex", vec![int(1), int(2)]),
            Ok(Object::Complex(Complex64::new(1.0, 2.0)))
        );
        assert_eq!(
            call("complex", vec![Object::Str("1-2j".into())]),
            Ok(Object::Complex(Complex64::new(1.0, -2.0)))
        );
        assert_eq!(
            call("divmod", vec![int(7), int(2)]),
            Ok(Object::Tuple(vec![int(3), int(1)]))
        );
    }

    #[test]
    fn test_arity() {
        assert!(matches!(call("sqrt", vec![]), Err(CalcError::Type(_))));
        assert!(matches!(call("atan2", vec![int(1)]), Err(CalcError::Type(_))));
    }
}

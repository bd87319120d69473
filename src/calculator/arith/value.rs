//! Runtime values of the arithmetic sandbox and their operators.
//!
//! Operators follow Python's numeric tower (`bool < int < float < complex`):
//! `/` is true division, `//` and `%` floor, integers are unbounded up to
//! [`MAX_INT_BITS`].

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_complex::Complex64;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use super::builtins::Builtin;
use crate::calculator::format;
use crate::calculator::outcome::CalcError;

/// Integers wider than this are reported as overflow.
pub const MAX_INT_BITS: u64 = 1 << 15;

/// Strings and tuples longer than this are reported as overflow.
/// Nested tuples count every element they hold.
const MAX_SEQUENCE_LEN: usize = 10_000;

/// Rendered text longer than this is reported as overflow.
const MAX_RENDER_LEN: usize = 100_000;

#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    None,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Complex(Complex64),
    Str(String),
    Tuple(Vec<Object>),
    Function(Builtin),
}

/// A numeric operand after promotion.
#[derive(Clone, Debug)]
pub enum Num {
    Int(BigInt),
    Float(f64),
    Complex(Complex64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
        }
    }
}

pub fn math_domain() -> CalcError {
    CalcError::failed("Calculation", "math domain error")
}

pub fn checked_int(n: BigInt) -> Result<Object, CalcError> {
    if n.bits() > MAX_INT_BITS {
        return Err(CalcError::Overflow);
    }
    Ok(Object::Int(n))
}

pub fn int_to_f64(n: &BigInt) -> Result<f64, CalcError> {
    n.to_f64()
        .filter(|x| x.is_finite())
        .ok_or(CalcError::Overflow)
}

/// Python's float `%`: the result takes the sign of the divisor.
fn float_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Complex(_) => "complex",
            Self::Str(_) => "str",
            Self::Tuple(_) => "tuple",
            Self::Function(_) => "builtin_function_or_method",
        }
    }

    pub fn num(&self) -> Option<Num> {
        match self {
            Self::Bool(b) => Some(Num::Int(BigInt::from(u8::from(*b)))),
            Self::Int(n) => Some(Num::Int(n.clone())),
            Self::Float(x) => Some(Num::Float(*x)),
            Self::Complex(z) => Some(Num::Complex(*z)),
            _ => None,
        }
    }

    /// Real value for `math` functions; complex and non-numeric values are rejected.
    pub fn to_real(&self) -> Result<f64, CalcError> {
        match self.num() {
            Some(Num::Int(n)) => int_to_f64(&n),
            Some(Num::Float(x)) => Ok(x),
            Some(Num::Complex(_)) => Err(CalcError::type_error("can't convert complex to float")),
            None => Err(CalcError::type_error(format!(
                "must be real number, not {}",
                self.type_name()
            ))),
        }
    }

    /// Integer value for integer-only functions (`gcd`, `factorial`, ...).
    pub fn to_int(&self) -> Result<BigInt, CalcError> {
        match self.num() {
            Some(Num::Int(n)) => Ok(n),
            _ => Err(CalcError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                self.type_name()
            ))),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => !n.is_zero(),
            Self::Float(x) => *x != 0.0,
            Self::Complex(z) => !z.is_zero(),
            Self::Str(s) => !s.is_empty(),
            Self::Tuple(items) => !items.is_empty(),
            Self::Function(_) => true,
        }
    }

    /// Python `repr`.
    /// Elements held, counted through nested tuples. Strings count bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Str(s) => s.len(),
            Self::Tuple(items) => items
                .iter()
                .fold(0usize, |acc, item| acc.saturating_add(item.size().max(1))),
            _ => 1,
        }
    }

    /// Display text, failing with overflow once it grows past the limit.
    pub fn render(&self) -> Result<String, CalcError> {
        let mut out = Bounded {
            text: String::new(),
            limit: MAX_RENDER_LEN,
        };
        fmt::write(&mut out, format_args!("{self}")).map_err(|_| CalcError::Overflow)?;
        Ok(out.text)
    }

    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => format!("'{s}'"),
            other => other.to_string(),
        }
    }

    pub fn negate(&self) -> Result<Object, CalcError> {
        match self.num() {
            Some(Num::Int(n)) => Ok(Object::Int(-n)),
            Some(Num::Float(x)) => Ok(Object::Float(-x)),
            Some(Num::Complex(z)) => Ok(Object::Complex(-z)),
            None => Err(CalcError::type_error(format!(
                "bad operand type for unary -: '{}'",
                self.type_name()
            ))),
        }
    }

    pub fn positive(&self) -> Result<Object, CalcError> {
        match self.num() {
            Some(n) => Ok(n.into()),
            None => Err(CalcError::type_error(format!(
                "bad operand type for unary +: '{}'",
                self.type_name()
            ))),
        }
    }

    pub fn binary(&self, op: BinOp, rhs: &Object) -> Result<Object, CalcError> {
        if let (Some(a), Some(b)) = (self.num(), rhs.num()) {
            return numeric(op, a, b);
        }
        match (op, self, rhs) {
            (BinOp::Add, Self::Str(a), Self::Str(b)) => sequence_len(a.len() + b.len())
                .map(|_| Object::Str(format!("{a}{b}"))),
            (BinOp::Add, Self::Tuple(a), Self::Tuple(b)) => {
                sequence_len(self.size().saturating_add(rhs.size()))?;
                Ok(Object::Tuple(a.iter().chain(b).cloned().collect()))
            }
            (BinOp::Mul, seq @ (Self::Str(_) | Self::Tuple(_)), count)
            | (BinOp::Mul, count, seq @ (Self::Str(_) | Self::Tuple(_)))
                if matches!(count, Self::Int(_) | Self::Bool(_)) =>
            {
                repeat(seq, count)
            }
            _ => Err(CalcError::type_error(format!(
                "unsupported operand type(s) for {}: '{}' and '{}'",
                op.symbol(),
                self.type_name(),
                rhs.type_name()
            ))),
        }
    }

    /// Ordering used by `min` and `max`.
    pub fn compare(&self, other: &Object) -> Result<Ordering, CalcError> {
        let unorderable = || {
            CalcError::type_error(format!(
                "'<' not supported between instances of '{}' and '{}'",
                self.type_name(),
                other.type_name()
            ))
        };
        match (self.num(), other.num()) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(a.cmp(&b)),
            (Some(Num::Complex(_)), _) | (_, Some(Num::Complex(_))) => Err(unorderable()),
            (Some(_), Some(_)) => {
                let (a, b) = (self.to_real()?, other.to_real()?);
                a.partial_cmp(&b).ok_or_else(unorderable)
            }
            _ => match (self, other) {
                (Self::Str(a), Self::Str(b)) => Ok(a.cmp(b)),
                _ => Err(unorderable()),
            },
        }
    }
}

fn sequence_len(len: usize) -> Result<usize, CalcError> {
    if len > MAX_SEQUENCE_LEN {
        return Err(CalcError::Overflow);
    }
    Ok(len)
}

fn repeat(seq: &Object, count: &Object) -> Result<Object, CalcError> {
    let count = count.to_int()?;
    let n = if count.is_negative() {
        0
    } else {
        count.to_usize().ok_or(CalcError::Overflow)?
    };
    sequence_len(seq.size().saturating_mul(n))?;
    match seq {
        Object::Str(s) => Ok(Object::Str(s.repeat(n))),
        Object::Tuple(items) => {
            Ok(Object::Tuple(
                std::iter::repeat_n(items, n).flatten().cloned().collect(),
            ))
        }
        _ => Err(CalcError::type_error("can't multiply sequence")),
    }
}

impl From<Num> for Object {
    fn from(n: Num) -> Self {
        match n {
            Num::Int(n) => Object::Int(n),
            Num::Float(x) => Object::Float(x),
            Num::Complex(z) => Object::Complex(z),
        }
    }
}

fn to_complex(n: &Num) -> Result<Complex64, CalcError> {
    Ok(match n {
        Num::Int(i) => Complex64::new(int_to_f64(i)?, 0.0),
        Num::Float(x) => Complex64::new(*x, 0.0),
        Num::Complex(z) => *z,
    })
}

fn to_float(n: &Num) -> Result<f64, CalcError> {
    match n {
        Num::Int(i) => int_to_f64(i),
        Num::Float(x) => Ok(*x),
        Num::Complex(_) => Err(CalcError::type_error("can't convert complex to float")),
    }
}

fn numeric(op: BinOp, a: Num, b: Num) -> Result<Object, CalcError> {
    match (&a, &b) {
        (Num::Int(x), Num::Int(y)) => int_op(op, x, y),
        (Num::Complex(_), _) | (_, Num::Complex(_)) => complex_op(op, to_complex(&a)?, to_complex(&b)?),
        _ => float_op(op, to_float(&a)?, to_float(&b)?),
    }
}

fn int_op(op: BinOp, a: &BigInt, b: &BigInt) -> Result<Object, CalcError> {
    match op {
        BinOp::Add => checked_int(a + b),
        BinOp::Sub => checked_int(a - b),
        BinOp::Mul => {
            if a.bits() + b.bits() > MAX_INT_BITS + 1 {
                return Err(CalcError::Overflow);
            }
            checked_int(a * b)
        }
        BinOp::Div => {
            if b.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            float_op(BinOp::Div, int_to_f64(a)?, int_to_f64(b)?)
        }
        BinOp::FloorDiv if b.is_zero() => Err(CalcError::DivisionByZero),
        BinOp::FloorDiv => Ok(Object::Int(a.div_floor(b))),
        BinOp::Mod if b.is_zero() => Err(CalcError::DivisionByZero),
        BinOp::Mod => Ok(Object::Int(a.mod_floor(b))),
        BinOp::Pow => int_pow(a, b),
    }
}

fn int_pow(base: &BigInt, exp: &BigInt) -> Result<Object, CalcError> {
    if exp.is_negative() {
        if base.is_zero() {
            return Err(CalcError::DivisionByZero);
        }
        return float_op(BinOp::Pow, int_to_f64(base)?, int_to_f64(exp)?);
    }
    let magnitude = base.abs();
    if magnitude <= BigInt::from(1) {
        let odd = exp.is_odd();
        return Ok(Object::Int(match () {
            _ if exp.is_zero() => BigInt::from(1),
            _ if base.is_negative() && !odd => BigInt::from(1),
            _ => base.clone(),
        }));
    }
    let e = exp.to_u64().ok_or(CalcError::Overflow)?;
    if (magnitude.bits() - 1).saturating_mul(e) > MAX_INT_BITS {
        return Err(CalcError::Overflow);
    }
    let e = u32::try_from(e).map_err(|_| CalcError::Overflow)?;
    checked_int(num_traits::pow(base.clone(), e as usize))
}

fn float_op(op: BinOp, a: f64, b: f64) -> Result<Object, CalcError> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div if b == 0.0 => return Err(CalcError::DivisionByZero),
        BinOp::Div => a / b,
        BinOp::FloorDiv if b == 0.0 => return Err(CalcError::DivisionByZero),
        BinOp::FloorDiv => ((a - float_mod(a, b)) / b).round(),
        BinOp::Mod if b == 0.0 => return Err(CalcError::DivisionByZero),
        BinOp::Mod => float_mod(a, b),
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(CalcError::DivisionByZero);
            }
            if a < 0.0 && b.fract() != 0.0 && b.is_finite() {
                return complex_op(BinOp::Pow, Complex64::new(a, 0.0), Complex64::new(b, 0.0));
            }
            let r = a.powf(b);
            if r.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(CalcError::Overflow);
            }
            r
        }
    };
    Ok(Object::Float(value))
}

fn complex_op(op: BinOp, a: Complex64, b: Complex64) -> Result<Object, CalcError> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div if b.is_zero() => return Err(CalcError::DivisionByZero),
        BinOp::Div => a / b,
        BinOp::FloorDiv | BinOp::Mod => {
            return Err(CalcError::type_error(format!(
                "unsupported operand type(s) for {}: 'complex' and 'complex'",
                op.symbol()
            )));
        }
        BinOp::Pow => {
            if b.is_zero() {
                Complex64::new(1.0, 0.0)
            } else if a.is_zero() {
                if b.im != 0.0 || b.re < 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                Complex64::new(0.0, 0.0)
            } else if b.im == 0.0 && b.re.fract() == 0.0 && b.re.abs() <= 100.0 {
                a.powi(b.re as i32)
            } else {
                a.powc(b)
            }
        }
    };
    if !(value.re.is_finite() && value.im.is_finite()) {
        return Err(CalcError::Overflow);
    }
    Ok(Object::Complex(value))
}

/// Python-style complex part: integral values drop their `.0`.
fn complex_part(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{}", x as i64)
    } else {
        format::repr(x)
    }
}

struct Bounded {
    text: String,
    limit: usize,
}

impl fmt::Write for Bounded {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.text.len() + s.len() > self.limit {
            return Err(fmt::Error);
        }
        self.text.push_str(s);
        Ok(())
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => f.write_str(&format::repr(*x)),
            Self::Complex(z) if z.re == 0.0 && z.re.is_sign_positive() => {
                write!(f, "{}j", complex_part(z.im))
            }
            Self::Complex(z) => {
                let sign = if z.im >= 0.0 || z.im.is_nan() { "+" } else { "" };
                write!(f, "({}{sign}{}j)", complex_part(z.re), complex_part(z.im))
            }
            Self::Str(s) => f.write_str(s),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Self::Str(s) => write!(f, "'{s}'")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str(if items.len() == 1 { ",)" } else { ")" })
            }
            Self::Function(b) => write!(f, "<built-in function {}>", b.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Object {
        Object::Int(BigInt::from(n))
    }

    fn op(a: Object, o: BinOp, b: Object) -> Result<Object, CalcError> {
        a.binary(o, &b)
    }

    #[test]
    fn test_true_and_floor_division() {
        assert_eq!(op(int(7), BinOp::Div, int(2)), Ok(Object::Float(3.5)));
        assert_eq!(op(int(-7), BinOp::FloorDiv, int(2)), Ok(int(-4)));
        assert_eq!(op(int(-7), BinOp::Mod, int(2)), Ok(int(1)));
        assert_eq!(op(Object::Float(-7.5), BinOp::Mod, int(2)), Ok(Object::Float(0.5)));
        assert_eq!(op(Object::Float(7.5), BinOp::FloorDiv, int(2)), Ok(Object::Float(3.0)));
    }

    #[test]
    fn test_division_by_zero() {
        for o in [BinOp::Div, BinOp::FloorDiv, BinOp::Mod] {
            assert_eq!(op(int(1), o, int(0)), Err(CalcError::DivisionByZero));
            assert_eq!(op(Object::Float(1.0), o, Object::Float(0.0)), Err(CalcError::DivisionByZero));
        }
        assert_eq!(op(int(0), BinOp::Pow, int(-1)), Err(CalcError::DivisionByZero));
    }

    #[test]
    fn test_powers() {
        assert_eq!(op(int(2), BinOp::Pow, int(10)), Ok(int(1024)));
        assert_eq!(op(int(2), BinOp::Pow, int(-1)), Ok(Object::Float(0.5)));
        assert_eq!(op(int(-1), BinOp::Pow, int(1_000_001)), Ok(int(-1)));
        assert_eq!(op(int(2), BinOp::Pow, int(100_000)), Err(CalcError::Overflow));
        assert_eq!(op(Object::Float(10.0), BinOp::Pow, int(400)), Err(CalcError::Overflow));
        assert!(matches!(
            op(int(-8), BinOp::Pow, Object::Float(0.5)),
            Ok(Object::Complex(_))
        ));
    }

    #[test]
    fn test_bool_promotes_to_int() {
        assert_eq!(op(Object::Bool(true), BinOp::Add, int(1)), Ok(int(2)));
    }

    #[test]
    fn test_sequences() {
        assert_eq!(
            op(Object::Str("ab".into()), BinOp::Mul, int(3)),
            Ok(Object::Str("ababab".into()))
        );
        assert_eq!(
            op(Object::Tuple(vec![int(1)]), BinOp::Add, Object::Tuple(vec![int(2)])),
            Ok(Object::Tuple(vec![int(1), int(2)]))
        );
        assert!(matches!(
            op(Object::Str("a".into()), BinOp::Add, int(1)),
            Err(CalcError::Type(_))
        ));
    }

    #[test]
    fn test_nested_repetition_counts_every_element() {
        let row = Object::Tuple(vec![int(1); 10_000]);
        assert_eq!(row.size(), 10_000);
        let nested = Object::Tuple(vec![row]);
        assert_eq!(op(nested.clone(), BinOp::Mul, int(2)), Err(CalcError::Overflow));
        assert_eq!(op(nested.clone(), BinOp::Add, nested.clone()), Err(CalcError::Overflow));
        assert_eq!(op(nested, BinOp::Mul, int(1)).map(|t| t.size()), Ok(10_000));

        let empties = Object::Tuple(vec![Object::Tuple(Vec::new())]);
        assert_eq!(op(empties, BinOp::Mul, int(10_001)), Err(CalcError::Overflow));
    }

    #[test]
    fn test_repeat_count_bounds() {
        let one = Object::Tuple(vec![int(1)]);
        assert_eq!(
            op(one.clone(), BinOp::Mul, Object::Int(BigInt::from(10u8).pow(30))),
            Err(CalcError::Overflow)
        );
        assert_eq!(op(one, BinOp::Mul, int(-3)), Ok(Object::Tuple(Vec::new())));
    }

    #[test]
    fn test_render_is_bounded() {
        let wide = Object::Tuple(vec![Object::Str("x".repeat(9_000)); 12]);
        assert_eq!(wide.render(), Err(CalcError::Overflow));
        assert_eq!(Object::Tuple(vec![int(1), int(2)]).render(), Ok("(1, 2)".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Object::Complex(Complex64::new(1.0, -2.0)).to_string(), "(1-2j)");
        assert_eq!(Object::Complex(Complex64::new(0.0, 1.5)).to_string(), "1.5j");
        assert_eq!(
            Object::Tuple(vec![int(3), Object::Float(1.0)]).to_string(),
            "(3, 1.0)"
        );
        assert_eq!(Object::Tuple(vec![Object::Str("a".into())]).to_string(), "('a',)");
        assert_eq!(Object::Bool(true).to_string(), "True");
    }

    #[test]
    fn test_compare() {
        assert_eq!(int(2).compare(&Object::Float(2.5)), Ok(Ordering::Less));
        assert!(int(1).compare(&Object::Str("a".into())).is_err());
    }
}

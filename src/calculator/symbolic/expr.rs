//! Expression tree for equation sides.

use crate::calculator::special;

/// Functions available inside equations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Func {
    Sqrt,
    Log,
    Exp,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Abs,
    Factorial,
    Pow,
    Rad,
    Deg,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sqrt" => Self::Sqrt,
            "log" | "ln" => Self::Log,
            "exp" => Self::Exp,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "abs" => Self::Abs,
            "factorial" => Self::Factorial,
            "pow" => Self::Pow,
            "rad" => Self::Rad,
            "deg" => Self::Deg,
            _ => return None,
        })
    }

    fn arity(self) -> &'static [usize] {
        match self {
            Self::Log => &[1, 2],
            Self::Pow => &[2],
            _ => &[1],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Num(f64),
    Const(f64),
    Var,
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

impl Expr {
    /// Build a call, checking the argument count.
    pub fn call(func: Func, args: Vec<Expr>) -> Result<Self, String> {
        if !func.arity().contains(&args.len()) {
            return Err(format!("{func:?} takes {:?} argument(s)", func.arity()));
        }
        Ok(Self::Call(func, args))
    }

    pub fn has_var(&self) -> bool {
        match self {
            Self::Var => true,
            Self::Num(_) | Self::Const(_) => false,
            Self::Neg(a) => a.has_var(),
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) | Self::Pow(a, b) => {
                a.has_var() || b.has_var()
            }
            Self::Call(_, args) => args.iter().any(Expr::has_var),
        }
    }

    /// Real value at `x`; NaN outside the function domains.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Self::Num(n) | Self::Const(n) => *n,
            Self::Var => x,
            Self::Neg(a) => -a.eval(x),
            Self::Add(a, b) => a.eval(x) + b.eval(x),
            Self::Sub(a, b) => a.eval(x) - b.eval(x),
            Self::Mul(a, b) => a.eval(x) * b.eval(x),
            Self::Div(a, b) => {
                let d = b.eval(x);
                if d == 0.0 { f64::NAN } else { a.eval(x) / d }
            }
            Self::Pow(a, b) => a.eval(x).powf(b.eval(x)),
            Self::Call(func, args) => {
                let v: Vec<f64> = args.iter().map(|a| a.eval(x)).collect();
                apply(*func, &v)
            }
        }
    }
}

fn apply(func: Func, v: &[f64]) -> f64 {
    let a = v[0];
    match func {
        Func::Sqrt => a.sqrt(),
        Func::Log if v.len() == 2 => a.ln() / v[1].ln(),
        Func::Log => a.ln(),
        Func::Exp => a.exp(),
        Func::Sin => a.sin(),
        Func::Cos => a.cos(),
        Func::Tan => a.tan(),
        Func::Asin => a.asin(),
        Func::Acos => a.acos(),
        Func::Atan => a.atan(),
        Func::Sinh => a.sinh(),
        Func::Cosh => a.cosh(),
        Func::Tanh => a.tanh(),
        Func::Abs => a.abs(),
        Func::Factorial => special::gamma(a + 1.0),
        Func::Pow => a.powf(v[1]),
        Func::Rad => a.to_radians(),
        Func::Deg => a.to_degrees(),
    }
}

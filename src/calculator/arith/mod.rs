//! Sandboxed arithmetic: the fallback domain.
//!
//! Text is normalized (percentages, radicals, thousands separators, `^`,
//! `x` as a multiplication sign), checked against a character allow-list,
//! tokenized and parsed by a dedicated grammar, then evaluated against the
//! closed table in [`builtins`]. Nothing outside that table is reachable.

pub mod builtins;
mod lexer;
mod parser;
mod value;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use super::format;
use super::outcome::{CalcError, Number, Value};
use parser::Node;
use value::Object;

lazy_static! {
    static ref RADICAL: Regex = Regex::new(r"√\s*(\([^)]+\)|[a-zA-Z_0-9.]+)").unwrap();

    /// `X% of Y`, each side a number or a parenthesized group.
    static ref PERCENT_OF: Regex = Regex::new(
        r"(?i)(\([^)]+\)|\d+\.?\d*|\.\d+)\s*%\s*of\s*(\([^)]+\)|\d+\.?\d*|\.\d+)"
    )
    .unwrap();

    static ref PERCENT: Regex = Regex::new(r"(\([^)]+\)|\d+\.?\d*|\.\d+)\s*%").unwrap();

    static ref ALLOWED: Regex = Regex::new(r"^[0-9a-z\s_().+\-*/%,]+$").unwrap();
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrite `X%` as a fraction unless it is glued to an identifier or the
/// `%` is a binary modulo (`10 % 3`).
fn rewrite_percent(text: &str) -> String {
    PERCENT
        .replace_all(text, |caps: &Captures| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let start = caps.get(0).map_or(0, |m| m.start());
            let end = start + whole.len();

            let glued = text[..start]
                .chars()
                .next_back()
                .is_some_and(|c| is_ident_char(c) || c == '.');
            let modulo = text[end..]
                .trim_start()
                .chars()
                .next()
                .is_some_and(|c| is_ident_char(c) || c == '(' || c == '.');

            if glued || modulo {
                whole.to_string()
            } else {
                format!("(({})/100)", &caps[1])
            }
        })
        .into_owned()
}

/// A comma inside `d,ddd` that ends a digit group.
fn is_grouping(chars: &[char], i: usize) -> bool {
    let digit = |j: usize| chars.get(j).is_some_and(|c| c.is_ascii_digit());
    i > 0 && digit(i - 1) && digit(i + 1) && digit(i + 2) && digit(i + 3) && !digit(i + 4)
}

/// Drop thousands separators. Commas inside a call's argument list always
/// separate arguments.
fn strip_thousands(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut calls: Vec<bool> = Vec::new();

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' => {
                let callee = out.trim_end().chars().next_back().is_some_and(is_ident_char);
                calls.push(callee);
            }
            ')' => {
                calls.pop();
            }
            ',' if !calls.last().copied().unwrap_or(false) && is_grouping(&chars, i) => continue,
            _ => {}
        }
        out.push(c);
    }
    out
}

/// `0x1f`: an `x` right after a leading zero and before a hex digit.
fn is_hex_prefix(chars: &[char], i: usize) -> bool {
    i >= 1
        && chars[i - 1] == '0'
        && (i < 2 || !(is_ident_char(chars[i - 2]) || chars[i - 2] == '.'))
        && chars.get(i + 1).is_some_and(char::is_ascii_hexdigit)
}

fn is_times(chars: &[char], i: usize) -> bool {
    let (Some(&prev), Some(&next)) = (
        i.checked_sub(1).and_then(|j| chars.get(j)),
        chars.get(i + 1),
    ) else {
        return false;
    };
    let left = prev.is_ascii_digit() || prev == ')' || prev.is_whitespace();
    let right = next.is_whitespace()
        || next.is_ascii_digit()
        || next == '('
        || next.is_ascii_lowercase()
        || next == '_';
    left && right && !is_hex_prefix(chars, i)
}

/// Read a free-standing `x` between operands as multiplication.
fn rewrite_times(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| if c == 'x' && is_times(&chars, i) { '*' } else { c })
        .collect()
}

/// Normalize arithmetic text into the sandbox grammar.
pub fn normalize(text: &str) -> Result<String, CalcError> {
    let work = RADICAL.replace_all(text.trim(), "sqrt($1)");
    let work = PERCENT_OF.replace_all(&work, "((${1})/100)*(${2})");
    let work = rewrite_percent(&work).to_lowercase();
    let work = strip_thousands(&work)
        .replace('×', "*")
        .replace('÷', "/")
        .replace('^', "**");
    let work = rewrite_times(&work);

    if !ALLOWED.is_match(&work) {
        warn!("Invalid characters for eval: '{}' (from original '{}')", work, text);
        return Err(CalcError::InvalidCharacters);
    }
    Ok(work)
}

fn eval(node: &Node) -> Result<Object, CalcError> {
    match node {
        Node::Literal(v) => Ok(v.clone()),
        Node::Name(name) => {
            builtins::lookup(name).ok_or_else(|| CalcError::UnknownIdentifier(name.clone()))
        }
        Node::Neg(a) => eval(a)?.negate(),
        Node::Pos(a) => eval(a)?.positive(),
        Node::Binary(op, a, b) => {
            let lhs = eval(a)?;
            let rhs = eval(b)?;
            lhs.binary(*op, &rhs)
        }
        Node::Call(callee, args) => {
            let callee = eval(callee)?;
            let args = args.iter().map(eval).collect::<Result<Vec<_>, _>>()?;
            match callee {
                Object::Function(f) => f.call(&args),
                other => Err(CalcError::type_error(format!(
                    "'{}' object is not callable",
                    other.type_name()
                ))),
            }
        }
        Node::Tuple(items) => Ok(Object::Tuple(
            items.iter().map(eval).collect::<Result<Vec<_>, _>>()?,
        )),
    }
}

fn into_value(result: Object) -> Result<Value, CalcError> {
    Ok(match result {
        Object::Int(n) => Value::Number(Number::Integer(n)),
        Object::Float(x) => format::canonical_float(x)?.into(),
        Object::Complex(z) => format::canonical_complex(z.re, z.im)?.into(),
        other => Value::Text(other.render()?),
    })
}

/// Evaluate arithmetic text in the sandbox.
pub fn evaluate(text: &str) -> Result<Value, CalcError> {
    let normalized = normalize(text)?;
    debug!("Final string for eval: '{}'", normalized);

    let tokens = lexer::tokenize(&normalized)?;
    let tree = parser::parse(tokens)?;
    into_value(eval(&tree)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(query: &str) -> String {
        evaluate(query).unwrap().to_string()
    }

    #[test]
    fn test_percentages() {
        assert_eq!(text("50% of 200"), "100");
        assert_eq!(text("25%"), "0.25");
        assert_eq!(text("(10+10)% of (50*2)"), "20");
        assert_eq!(text("200 * 15%"), "30");
        assert_eq!(text("10 % 3"), "1");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("2^10").unwrap(), "2**10");
        assert_eq!(normalize("2 x 3").unwrap(), "2 * 3");
        assert_eq!(normalize("(2)x(3)").unwrap(), "(2)*(3)");
        assert_eq!(normalize("0x1F + exp(1)").unwrap(), "0x1f + exp(1)");
        assert_eq!(normalize("√16").unwrap(), "sqrt(16)");
        assert_eq!(normalize("1,234,567").unwrap(), "1234567");
        assert_eq!(normalize("pow(2,100)").unwrap(), "pow(2,100)");
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(text("2^10"), "1024");
        assert_eq!(text("10 x 5"), "50");
        assert_eq!(text("0x1f + 1"), "32");
        assert_eq!(text("-2**2"), "-4");
        assert_eq!(text("7 // 2"), "3");
        assert_eq!(text("10/4"), "2.5");
        assert_eq!(text("0.1 + 0.2"), "0.3");
        assert_eq!(text("1/3"), "0.333333333333");
        assert_eq!(text("sqrt(2)"), "1.41421356237");
        assert_eq!(text("1,234,567 + 1"), "1234568");
        assert_eq!(text("pow(2,100)"), "1267650600228229401496703205376");
    }

    #[test]
    fn test_functions() {
        assert_eq!(text("sqrt(16)"), "4");
        assert_eq!(text("√(9)+1"), "4");
        assert_eq!(text("abs(-3)"), "3");
        assert_eq!(text("factorial(5)"), "120");
        assert_eq!(text("round(2.5)"), "2");
        assert_eq!(text("max(3, 7, 5)"), "7");
        assert_eq!(text("divmod(7, 2)"), "(3, 1)");
        assert_eq!(text("deg(pi)"), "180");
        assert_eq!(text("sin(pi/2)"), "1");
    }

    #[test]
    fn test_complex_results() {
        assert_eq!(text("(-8)**(1/3)"), "1+1.73205j");
        assert_eq!(text("1j**2"), "-1");
        assert_eq!(text("2j"), "2j");
        assert_eq!(text("complex(0, -1)"), "-j");
    }

    #[test]
    fn test_passthrough_results() {
        assert_eq!(text("true + 1"), "2");
        assert_eq!(text("str(5)"), "5");
        assert_eq!(text("1, 2"), "(1, 2)");
        assert_eq!(text("sqrt"), "<built-in function sqrt>");
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate("10/0"), Err(CalcError::DivisionByZero));
        assert_eq!(
            evaluate("foo(1)"),
            Err(CalcError::UnknownIdentifier("foo".into()))
        );
        assert_eq!(evaluate("2 = 3"), Err(CalcError::InvalidCharacters));
        assert_eq!(evaluate("1 +"), Err(lexer::syntax_error()));
        assert!(matches!(evaluate("2(3)"), Err(CalcError::Type(_))));
        assert_eq!(evaluate("10.0**400"), Err(CalcError::Overflow));
        assert_eq!(evaluate("1e308 * 10"), Err(CalcError::Overflow));
        assert!(matches!(evaluate("sqrt(-1)"), Err(CalcError::Failed { .. })));
    }

    #[test]
    fn test_nested_sequences_stay_bounded() {
        assert_eq!(evaluate("((1,)*10000,)*10000"), Err(CalcError::Overflow));
        assert_eq!(evaluate("((1,)*10000,)*1000"), Err(CalcError::Overflow));
        assert_eq!(evaluate("(1,)*10**30"), Err(CalcError::Overflow));
        assert_eq!(evaluate("len(((1,)*100,)*100)"), Ok(Value::Number(Number::Integer(100.into()))));
    }

    #[test]
    fn test_sandbox_rejects_escape_attempts() {
        assert_eq!(
            evaluate("__import__(1)"),
            Err(CalcError::UnknownIdentifier("__import__".into()))
        );
        assert_eq!(evaluate("__import__('os')"), Err(CalcError::InvalidCharacters));
        assert_eq!(evaluate("pi.real"), Err(lexer::syntax_error()));
        assert_eq!(
            evaluate("(1).__class__"),
            Err(lexer::syntax_error())
        );
        assert_eq!(evaluate("eval"), Err(CalcError::UnknownIdentifier("eval".into())));
    }
}

//! Parser for one side of an equation.
//!
//! Accepts implicit multiplication (`2x`, `3(x+1)`, `(x-1)(x+1)`) and
//! implicit function application (`sin x`). Names resolve against a fixed
//! table; `x` is the only free variable.

use std::f64::consts::{E, PI};

use super::expr::{Expr, Func};

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    Num(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Comma,
    LPar,
    RPar,
}

fn tokenize(s: &str) -> Result<Vec<Tok>, String> {
    let chars: Vec<char> = s.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                out.push(Tok::Plus);
                i += 1;
            }
            '-' => {
                out.push(Tok::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                out.push(Tok::Caret);
                i += 2;
            }
            '*' => {
                out.push(Tok::Star);
                i += 1;
            }
            '/' => {
                out.push(Tok::Slash);
                i += 1;
            }
            '^' => {
                out.push(Tok::Caret);
                i += 1;
            }
            ',' => {
                out.push(Tok::Comma);
                i += 1;
            }
            '(' | '[' | '{' => {
                out.push(Tok::LPar);
                i += 1;
            }
            ')' | ']' | '}' => {
                out.push(Tok::RPar);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{text}'"))?;
                out.push(Tok::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                split_name(&word, &mut out)?;
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(out)
}

fn is_known(name: &str) -> bool {
    matches!(name, "x" | "pi" | "e") || Func::from_name(name).is_some()
}

/// Known names stay whole; otherwise a run made only of single-letter
/// symbols is split (`xx` -> `x x`, `ex` -> `e x`).
fn split_name(word: &str, out: &mut Vec<Tok>) -> Result<(), String> {
    if is_known(word) {
        out.push(Tok::Name(word.to_string()));
        return Ok(());
    }
    if word.chars().all(|c| c == 'x' || c == 'e') {
        out.extend(word.chars().map(|c| Tok::Name(c.to_string())));
        return Ok(());
    }
    Err(format!("unknown symbol '{word}'"))
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn starts_factor(&self) -> bool {
        matches!(self.peek(), Some(Tok::Num(_) | Tok::Name(_) | Tok::LPar))
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.term()?;
        loop {
            if self.eat(&Tok::Plus) {
                lhs = Expr::Add(Box::new(lhs), Box::new(self.term()?));
            } else if self.eat(&Tok::Minus) {
                lhs = Expr::Sub(Box::new(lhs), Box::new(self.term()?));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        loop {
            if self.eat(&Tok::Star) {
                lhs = Expr::Mul(Box::new(lhs), Box::new(self.unary()?));
            } else if self.eat(&Tok::Slash) {
                lhs = Expr::Div(Box::new(lhs), Box::new(self.unary()?));
            } else if self.starts_factor() {
                lhs = Expr::Mul(Box::new(lhs), Box::new(self.power()?));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat(&Tok::Minus) {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat(&Tok::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, String> {
        let base = self.primary()?;
        if self.eat(&Tok::Caret) {
            let exponent = self.unary()?;
            return Ok(Expr::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Tok::Num(n)) => Ok(Expr::Num(n)),
            Some(Tok::Name(name)) => match name.as_str() {
                "x" => Ok(Expr::Var),
                "pi" => Ok(Expr::Const(PI)),
                "e" => Ok(Expr::Const(E)),
                _ => {
                    let func = Func::from_name(&name).ok_or(format!("unknown symbol '{name}'"))?;
                    self.call(func)
                }
            },
            Some(Tok::LPar) => {
                let inner = self.expr()?;
                if !self.eat(&Tok::RPar) {
                    return Err("unbalanced parentheses".into());
                }
                Ok(inner)
            }
            Some(other) => Err(format!("unexpected token {other:?}")),
            None => Err("unexpected end of input".into()),
        }
    }

    fn call(&mut self, func: Func) -> Result<Expr, String> {
        if !self.eat(&Tok::LPar) {
            // implicit application: `sin x`
            let arg = self.power()?;
            return Expr::call(func, vec![arg]);
        }
        let mut args = vec![self.expr()?];
        while self.eat(&Tok::Comma) {
            args.push(self.expr()?);
        }
        if !self.eat(&Tok::RPar) {
            return Err("unbalanced parentheses".into());
        }
        Expr::call(func, args)
    }
}

/// Parse one side of an equation.
pub fn parse(s: &str) -> Result<Expr, String> {
    let toks = tokenize(s)?;
    if toks.is_empty() {
        return Err("empty expression".into());
    }
    let mut parser = Parser { toks, pos: 0 };
    let expr = parser.expr()?;
    if parser.pos != parser.toks.len() {
        return Err("trailing input".into());
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str, x: f64) -> f64 {
        parse(s).unwrap().eval(x)
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(at("2x", 3.0), 6.0);
        assert_eq!(at("3(x+1)", 1.0), 6.0);
        assert_eq!(at("(x-1)(x+1)", 3.0), 8.0);
        assert_eq!(at("2x^2", 3.0), 18.0);
        assert_eq!(at("xx", 4.0), 16.0);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(at("-x**2", 3.0), -9.0);
        assert_eq!(at("2^3^2", 0.0), 512.0);
        assert_eq!(at("x/2*4", 1.0), 2.0);
    }

    #[test]
    fn test_functions() {
        assert!((at("sin x", PI / 2.0) - 1.0).abs() < 1e-12);
        assert!((at("log(e)", 0.0) - 1.0).abs() < 1e-12);
        assert!((at("ln(x)", E) - 1.0).abs() < 1e-12);
        assert_eq!(at("pow(x, 2)", 5.0), 25.0);
        assert!((at("rad(180)", 0.0) - PI).abs() < 1e-12);
        assert_eq!(at("factorial(4)", 0.0), 24.0);
    }

    #[test]
    fn test_rejects_unknown_names() {
        assert!(parse("x + y").is_err());
        assert!(parse("foo(x)").is_err());
        assert!(parse("(x + 1").is_err());
        assert!(parse("").is_err());
    }
}

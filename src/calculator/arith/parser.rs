//! Recursive-descent parser for the arithmetic grammar.
//!
//! ```text
//! expr    := sum ("," sum)* [","]
//! sum     := term (("+" | "-") term)*
//! term    := factor (("*" | "/" | "//" | "%") factor)*
//! factor  := ("+" | "-") factor | power
//! power   := call ["**" factor]
//! call    := atom ("(" [sum ("," sum)* [","]] ")")*
//! atom    := number | name | "(" [expr] ")"
//! ```

use super::lexer::{Token, syntax_error};
use super::value::{BinOp, Object};
use crate::calculator::outcome::CalcError;

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Literal(Object),
    Name(String),
    Neg(Box<Node>),
    Pos(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
    Call(Box<Node>, Vec<Node>),
    Tuple(Vec<Node>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), CalcError> {
        if self.eat(token) { Ok(()) } else { Err(syntax_error()) }
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Int(_)
                    | Token::Float(_)
                    | Token::Imaginary(_)
                    | Token::Name(_)
                    | Token::LParen
                    | Token::Plus
                    | Token::Minus
            )
        )
    }

    /// A comma-separated list; a single element without a trailing comma is
    /// the element itself.
    fn expr(&mut self) -> Result<Node, CalcError> {
        let first = self.sum()?;
        if !self.eat(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.starts_operand() {
            items.push(self.sum()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(Node::Tuple(items))
    }

    fn sum(&mut self) -> Result<Node, CalcError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(self.term()?));
        }
    }

    fn term(&mut self) -> Result<Node, CalcError> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::DoubleSlash) => BinOp::FloorDiv,
                Some(Token::Percent) => BinOp::Mod,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(self.factor()?));
        }
    }

    fn factor(&mut self) -> Result<Node, CalcError> {
        if self.eat(&Token::Minus) {
            return Ok(Node::Neg(Box::new(self.factor()?)));
        }
        if self.eat(&Token::Plus) {
            return Ok(Node::Pos(Box::new(self.factor()?)));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Node, CalcError> {
        let base = self.call()?;
        if self.eat(&Token::DoubleStar) {
            let exponent = self.factor()?;
            return Ok(Node::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn call(&mut self) -> Result<Node, CalcError> {
        let mut node = self.atom()?;
        while self.eat(&Token::LParen) {
            let mut args = Vec::new();
            while !self.eat(&Token::RParen) {
                args.push(self.sum()?);
                if !self.eat(&Token::Comma) {
                    self.expect(&Token::RParen)?;
                    break;
                }
            }
            node = Node::Call(Box::new(node), args);
        }
        Ok(node)
    }

    fn atom(&mut self) -> Result<Node, CalcError> {
        let token = self.peek().cloned().ok_or_else(syntax_error)?;
        self.pos += 1;
        match token {
            Token::Int(n) => Ok(Node::Literal(Object::Int(n))),
            Token::Float(x) => Ok(Node::Literal(Object::Float(x))),
            Token::Imaginary(x) => Ok(Node::Literal(Object::Complex(
                num_complex::Complex64::new(0.0, x),
            ))),
            Token::Name(name) => Ok(Node::Name(name)),
            Token::LParen => {
                if self.eat(&Token::RParen) {
                    return Ok(Node::Tuple(Vec::new()));
                }
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            _ => Err(syntax_error()),
        }
    }
}

/// Parse a complete token stream.
pub fn parse(tokens: Vec<Token>) -> Result<Node, CalcError> {
    if tokens.is_empty() {
        return Err(syntax_error());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let node = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(syntax_error());
    }
    Ok(node)
}

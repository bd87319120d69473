//! Tokenizer for normalized arithmetic text.

use num_bigint::BigInt;

use crate::calculator::outcome::CalcError;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Int(BigInt),
    Float(f64),
    Imaginary(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
    Comma,
}

pub fn syntax_error() -> CalcError {
    CalcError::parse("Syntax error")
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.bytes.get(self.pos).map(|b| *b as char)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.bytes.get(self.pos + offset).map(|b| *b as char)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn prefixed(&mut self, radix: u32) -> Result<Token, CalcError> {
        self.pos += 2;
        let digits = self.take_while(|c| c.is_digit(radix));
        if digits.is_empty() || self.peek().is_some_and(is_ident_char) {
            return Err(syntax_error());
        }
        BigInt::parse_bytes(digits.as_bytes(), radix)
            .map(Token::Int)
            .ok_or_else(syntax_error)
    }

    fn number(&mut self) -> Result<Token, CalcError> {
        if self.peek() == Some('0') {
            match self.peek_at(1) {
                Some('x') => return self.prefixed(16),
                Some('b') => return self.prefixed(2),
                Some('o') => return self.prefixed(8),
                _ => {}
            }
        }

        let start = self.pos;
        let mut is_float = false;
        self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            self.take_while(|c| c.is_ascii_digit());
        }
        if self.peek() == Some('e') {
            let sign = usize::from(matches!(self.peek_at(1), Some('+' | '-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.pos += 1 + sign;
                self.take_while(|c| c.is_ascii_digit());
            }
        }
        let text = &self.src[start..self.pos];
        if text == "." {
            return Err(syntax_error());
        }

        let token = if self.peek() == Some('j') {
            self.pos += 1;
            Token::Imaginary(text.parse().map_err(|_| syntax_error())?)
        } else if is_float {
            Token::Float(text.parse().map_err(|_| syntax_error())?)
        } else {
            Token::Int(text.parse().map_err(|_| syntax_error())?)
        };

        // `2pi`, `5x`: Python has no implicit multiplication
        if self.peek().is_some_and(is_ident_char) {
            return Err(syntax_error());
        }
        Ok(token)
    }

    fn next_token(&mut self) -> Option<Result<Token, CalcError>> {
        self.take_while(|c| c.is_ascii_whitespace());
        let c = self.peek()?;
        let two = |tok| (2usize, tok);
        let one = |tok| (1usize, tok);

        let (len, token) = match (c, self.peek_at(1)) {
            ('*', Some('*')) => two(Token::DoubleStar),
            ('/', Some('/')) => two(Token::DoubleSlash),
            ('*', _) => one(Token::Star),
            ('/', _) => one(Token::Slash),
            ('+', _) => one(Token::Plus),
            ('-', _) => one(Token::Minus),
            ('%', _) => one(Token::Percent),
            ('(', _) => one(Token::LParen),
            (')', _) => one(Token::RParen),
            (',', _) => one(Token::Comma),
            (c, next) if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                return Some(self.number());
            }
            (c, _) if c.is_ascii_alphabetic() || c == '_' => {
                let name = self.take_while(is_ident_char);
                return Some(Ok(Token::Name(name.to_string())));
            }
            _ => return Some(Err(syntax_error())),
        };
        self.pos += len;
        Some(Ok(token))
    }
}

/// Split `src` into tokens. Anything outside the arithmetic grammar,
/// attribute access included, is a syntax error.
pub fn tokenize(src: &str) -> Result<Vec<Token>, CalcError> {
    if !src.is_ascii() {
        return Err(CalcError::InvalidCharacters);
    }
    let mut lexer = Lexer {
        src,
        bytes: src.as_bytes(),
        pos: 0,
    };
    std::iter::from_fn(|| lexer.next_token()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Token {
        Token::Int(BigInt::from(n))
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokenize("1 ** 2 // 3 % 4").unwrap(),
            vec![
                int(1),
                Token::DoubleStar,
                int(2),
                Token::DoubleSlash,
                int(3),
                Token::Percent,
                int(4)
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokenize("0x1f").unwrap(), vec![int(31)]);
        assert_eq!(tokenize("0b101 0o17").unwrap(), vec![int(5), int(15)]);
        assert_eq!(tokenize(".5").unwrap(), vec![Token::Float(0.5)]);
        assert_eq!(tokenize("5.").unwrap(), vec![Token::Float(5.0)]);
        assert_eq!(tokenize("1e3").unwrap(), vec![Token::Float(1000.0)]);
        assert_eq!(tokenize("2.5e-1").unwrap(), vec![Token::Float(0.25)]);
        assert_eq!(tokenize("3j").unwrap(), vec![Token::Imaginary(3.0)]);
    }

    #[test]
    fn test_names_and_calls() {
        assert_eq!(
            tokenize("atan2(1, 2)").unwrap(),
            vec![
                Token::Name("atan2".into()),
                Token::LParen,
                int(1),
                Token::Comma,
                int(2),
                Token::RParen
            ]
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(tokenize("5x"), Err(syntax_error()));
        assert_eq!(tokenize("0x"), Err(syntax_error()));
        assert_eq!(tokenize("0b102"), Err(syntax_error()));
        assert_eq!(tokenize("pi.real"), Err(syntax_error()));
        assert_eq!(tokenize("2 = 3"), Err(syntax_error()));
    }
}

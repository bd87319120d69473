//! Hexadecimal, binary, octal and decimal conversion.

use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_traits::Signed;
use regex::Regex;
use tracing::debug;

use super::outcome::{CalcError, Value};

lazy_static! {
    /// `hex(255)`, `bin(0x1f)`, `oct(8)`
    static ref FUNCTION_FORM: Regex = Regex::new(r"^(hex|bin|oct)\s*\((.+)\)").unwrap();

    /// `255 to hex`, `ff hex to dec`
    static ref TO_FORM: Regex =
        Regex::new(r"^(.+?)\s+(?:(bin|hex|oct|dec)\s+)?to\s+(bin|hex|oct|dec)\b").unwrap();

    /// A prefixed literal on its own.
    static ref BARE_LITERAL: Regex = Regex::new(r"^(?:0x[0-9a-f]+|0b[01]+|0o[0-7]+)$").unwrap();
}

/// A numeric base with a conventional textual form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Radix {
    Hex,
    Bin,
    Oct,
    Dec,
}

impl Radix {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "hex" => Some(Self::Hex),
            "bin" => Some(Self::Bin),
            "oct" => Some(Self::Oct),
            "dec" => Some(Self::Dec),
            _ => None,
        }
    }

    /// Base implied by a literal's own prefix, decimal when unprefixed.
    /// A sign in front of the prefix hides it, so `-0x10` reads as a
    /// malformed decimal; `-0x10 hex to dec` names the base and converts.
    pub fn infer(literal: &str) -> Self {
        if literal.starts_with("0x") {
            Self::Hex
        } else if literal.starts_with("0b") {
            Self::Bin
        } else if literal.starts_with("0o") {
            Self::Oct
        } else {
            Self::Dec
        }
    }

    pub fn value(self) -> u32 {
        match self {
            Self::Hex => 16,
            Self::Bin => 2,
            Self::Oct => 8,
            Self::Dec => 10,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Hex => "0x",
            Self::Bin => "0b",
            Self::Oct => "0o",
            Self::Dec => "",
        }
    }

    /// Render `n`; decimal is a bare digit string, the others carry their prefix.
    pub fn render(self, n: &BigInt) -> String {
        let sign = if n.is_negative() { "-" } else { "" };
        format!(
            "{sign}{}{}",
            self.prefix(),
            n.abs().to_str_radix(self.value())
        )
    }
}

fn invalid_literal() -> CalcError {
    CalcError::parse("Invalid number for base conversion")
}

/// Parse an integer literal in `radix`. An optional sign and the radix's own
/// prefix are accepted, as are single underscores between digits.
pub fn parse_literal(text: &str, radix: Radix) -> Result<BigInt, CalcError> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits = unsigned.strip_prefix(radix.prefix()).unwrap_or(unsigned);

    let well_formed = !digits.is_empty()
        && !digits.starts_with('_')
        && !digits.ends_with('_')
        && !digits.contains("__")
        && digits
            .chars()
            .all(|c| c == '_' || c.is_digit(radix.value()));
    if !well_formed {
        return Err(invalid_literal());
    }

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let magnitude =
        BigInt::parse_bytes(cleaned.as_bytes(), radix.value()).ok_or_else(invalid_literal)?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Evaluate a base-conversion query.
pub fn convert(text: &str) -> Result<Value, CalcError> {
    let work = text.trim().to_lowercase();
    debug!("Base handler received: '{}'", work);

    if let Some(caps) = FUNCTION_FORM.captures(&work) {
        let target = Radix::from_keyword(&caps[1]).unwrap_or(Radix::Dec);
        let literal = caps[2].trim();
        let n = parse_literal(literal, Radix::infer(literal))?;
        return Ok(Value::Text(target.render(&n)));
    }

    if let Some(caps) = TO_FORM.captures(&work) {
        let literal = caps[1].trim();
        let source = caps
            .get(2)
            .and_then(|m| Radix::from_keyword(m.as_str()))
            .unwrap_or_else(|| Radix::infer(literal));
        let target = Radix::from_keyword(&caps[3]).unwrap_or(Radix::Dec);
        let n = parse_literal(literal, source)?;
        return Ok(Value::Text(target.render(&n)));
    }

    if BARE_LITERAL.is_match(&work) {
        let n = parse_literal(&work, Radix::infer(&work))?;
        return Ok(Value::Text(format!("{n} (decimal)")));
    }

    Err(CalcError::Unrecognized(
        "Base conversion format not recognized".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(query: &str) -> String {
        convert(query).unwrap().to_string()
    }

    #[test]
    fn test_function_form() {
        assert_eq!(text("hex(255)"), "0xff");
        assert_eq!(text("bin(5)"), "0b101");
        assert_eq!(text("oct(0x1f)"), "0o37");
        assert_eq!(text("HEX(-255)"), "-0xff");
    }

    #[test]
    fn test_to_form() {
        assert_eq!(text("0xFF to dec"), "255");
        assert_eq!(text("255 to hex"), "0xff");
        assert_eq!(text("ff hex to dec"), "255");
        assert_eq!(text("101 bin to oct"), "0o5");
        assert_eq!(text("0b1111_0000 to hex"), "0xf0");
    }

    #[test]
    fn test_bare_literal() {
        assert_eq!(text("0x1F"), "31 (decimal)");
        assert_eq!(text("0b101"), "5 (decimal)");
        assert_eq!(text("0o17"), "15 (decimal)");
    }

    #[test]
    fn test_invalid_digits() {
        assert_eq!(convert("12z to hex"), Err(invalid_literal()));
        assert_eq!(convert("9 oct to dec"), Err(invalid_literal()));
        assert_eq!(convert("hex(0xg)"), Err(invalid_literal()));
    }

    #[test]
    fn test_signed_prefixed_literal_needs_explicit_base() {
        assert_eq!(convert("-0x10 to dec"), Err(invalid_literal()));
        assert_eq!(convert("hex(-0b1)"), Err(invalid_literal()));
        assert_eq!(text("-0x10 hex to dec"), "-16");
        assert_eq!(text("-10 to hex"), "-0xa");
    }

    #[test]
    fn test_unrecognized_shape() {
        assert!(matches!(
            convert("0x10 + 5"),
            Err(CalcError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_large_values() {
        assert_eq!(
            text("0xffffffffffffffffffff to dec"),
            "1208925819614629174706175"
        );
    }
}

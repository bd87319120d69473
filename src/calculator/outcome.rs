//! Result types shared by every evaluation domain.

use std::fmt;

use num_bigint::BigInt;
use thiserror::Error;

use super::capability::CapabilityKind;
use super::format;
use super::symbolic::Solution;

/// A canonical number produced by a handler.
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(BigInt),
    Float(f64),
    /// Complex value whose imaginary part is non-zero.
    Complex { re: f64, im: f64 },
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => f.write_str(&format::repr(*x)),
            Self::Complex { re, im } => f.write_str(&format::complex(*re, *im)),
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self::Integer(BigInt::from(n))
    }
}

/// Either a canonical number or a pre-formatted, domain-specific string.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(Number),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(n) => Some(n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

/// Error taxonomy callers can branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    UnsupportedCapability,
    Semantic,
    SandboxRejected,
    Overflow,
}

/// Every way an evaluation can fail.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CalcError {
    #[error("{0}")]
    Parse(String),
    #[error("{0} not available")]
    Unsupported(CapabilityKind),
    #[error("No solution found")]
    NoSolution,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("{0}")]
    InsufficientData(String),
    #[error("No unique mode or multimodal data")]
    NoUniqueMode,
    #[error("{0}")]
    Unrecognized(String),
    #[error("Invalid characters in expression")]
    InvalidCharacters,
    #[error("Unknown function/variable '{0}'")]
    UnknownIdentifier(String),
    #[error("Invalid function/op or type ({0})")]
    Type(String),
    #[error("Result too large")]
    Overflow,
    /// Unexpected failure; carries the failure category for diagnostics.
    #[error("{context} failed ({category})")]
    Failed {
        context: &'static str,
        category: String,
    },
}

impl CalcError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    pub fn failed(context: &'static str, category: impl Into<String>) -> Self {
        Self::Failed {
            context,
            category: category.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) => ErrorKind::Parse,
            Self::Unsupported(_) => ErrorKind::UnsupportedCapability,
            Self::InvalidCharacters | Self::UnknownIdentifier(_) => ErrorKind::SandboxRejected,
            Self::Overflow => ErrorKind::Overflow,
            Self::NoSolution
            | Self::DivisionByZero
            | Self::InsufficientData(_)
            | Self::NoUniqueMode
            | Self::Unrecognized(_)
            | Self::Type(_)
            | Self::Failed { .. } => ErrorKind::Semantic,
        }
    }
}

/// The tagged result of evaluating one query.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Value {
        value: Value,
        /// Symbolic handle for high-fidelity re-rendering of equation results.
        solution: Option<Solution>,
    },
    Info(String),
    Error(CalcError),
}

impl Outcome {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value {
            value: value.into(),
            solution: None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value { .. })
    }

    pub fn is_info(&self) -> bool {
        matches!(self, Self::Info(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn error(&self) -> Option<&CalcError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// The result text without any "Error:"/"Info:" decoration.
    pub fn message(&self) -> String {
        match self {
            Self::Value { value, .. } => value.to_string(),
            Self::Info(msg) => msg.clone(),
            Self::Error(e) => e.to_string(),
        }
    }
}

impl From<Result<Value, CalcError>> for Outcome {
    fn from(result: Result<Value, CalcError>) -> Self {
        match result {
            Ok(value) => Self::value(value),
            Err(e) => Self::Error(e),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value { value, .. } => value.fmt(f),
            Self::Info(msg) => write!(f, "Info: {msg}"),
            Self::Error(e) => write!(f, "Error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(Outcome::Info("hi".into()).to_string(), "Info: hi");
        assert_eq!(
            Outcome::Error(CalcError::DivisionByZero).to_string(),
            "Error: Division by zero"
        );
        assert_eq!(Outcome::value(Number::from(4)).to_string(), "4");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(CalcError::InvalidCharacters.kind(), ErrorKind::SandboxRejected);
        assert_eq!(
            CalcError::UnknownIdentifier("foo".into()).kind(),
            ErrorKind::SandboxRejected
        );
        assert_eq!(CalcError::NoSolution.kind(), ErrorKind::Semantic);
        assert_eq!(CalcError::Overflow.kind(), ErrorKind::Overflow);
        assert_eq!(
            CalcError::Unsupported(CapabilityKind::Statistics).kind(),
            ErrorKind::UnsupportedCapability
        );
    }

    #[test]
    fn test_failed_names_category() {
        let e = CalcError::failed("Calculation", "math domain error");
        assert_eq!(e.to_string(), "Calculation failed (math domain error)");
    }
}

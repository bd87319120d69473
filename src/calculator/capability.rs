//! Optional capabilities and their one-shot "unavailable" notice.
//!
//! A capability is decided once, when the [`Calculator`](super::Calculator)
//! is built: either a provider is injected or it is missing. A missing
//! capability answers with an informational notice the first time it is
//! needed and with an error on every later use.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::NaiveDateTime;
use thiserror::Error;

use super::outcome::{CalcError, Outcome};
use super::symbolic::Solution;

/// The optional subsystems a calculator may be built without.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    SymbolicAlgebra,
    CalendarArithmetic,
    Statistics,
}

impl CapabilityKind {
    /// Informational text shown the first time the capability is missing.
    pub fn notice(self) -> &'static str {
        match self {
            Self::SymbolicAlgebra => "Symbolic algebra needed for equations.",
            Self::CalendarArithmetic => "Calendar arithmetic needed for date calculations.",
            Self::Statistics => "Statistics support needed.",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SymbolicAlgebra => "Symbolic algebra",
            Self::CalendarArithmetic => "Calendar arithmetic",
            Self::Statistics => "Statistics",
        })
    }
}

/// Observable phase of a [`CapabilityState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Available,
    Unnotified,
    Notified,
}

const AVAILABLE: u8 = 0;
const UNNOTIFIED: u8 = 1;
const NOTIFIED: u8 = 2;

/// Monotonic state machine: `Unnotified -> Notified`, or `Available` forever.
#[derive(Debug)]
pub struct CapabilityState(AtomicU8);

impl CapabilityState {
    pub fn available() -> Self {
        Self(AtomicU8::new(AVAILABLE))
    }

    pub fn unavailable() -> Self {
        Self(AtomicU8::new(UNNOTIFIED))
    }

    pub fn phase(&self) -> Phase {
        match self.0.load(Ordering::Acquire) {
            AVAILABLE => Phase::Available,
            UNNOTIFIED => Phase::Unnotified,
            _ => Phase::Notified,
        }
    }

    /// Returns `true` for exactly one caller, even under concurrent first use.
    pub fn take_notice(&self) -> bool {
        self.0
            .compare_exchange(UNNOTIFIED, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Failure reported by a capability provider.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ProviderError {
    #[error("parse failure: {0}")]
    Parse(String),
    #[error("{0}")]
    Domain(String),
}

/// Symbolic algebra: parse two sides of an equation and solve for one variable.
pub trait SymbolicAlgebra: Send + Sync {
    fn parse_and_solve(
        &self,
        lhs: &str,
        rhs: &str,
        variable: &str,
    ) -> Result<Vec<Solution>, ProviderError>;

    /// Plain display text of a solution.
    fn format(&self, solution: &Solution) -> String;

    /// Typeset (LaTeX) text of a solution.
    fn to_markup(&self, solution: &Solution) -> String;
}

/// Unit of a calendar interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntervalUnit {
    Days,
    Weeks,
    Months,
    Years,
}

/// A signed calendar interval, e.g. "-3 months".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub amount: i64,
    pub unit: IntervalUnit,
}

/// Calendar arithmetic: free-form date parsing and calendar-correct shifts.
pub trait CalendarArithmetic: Send + Sync {
    fn parse(&self, text: &str, now: NaiveDateTime) -> Result<NaiveDateTime, ProviderError>;

    fn shift(&self, at: NaiveDateTime, interval: Interval) -> Result<NaiveDateTime, ProviderError>;
}

/// Descriptive statistics over a non-empty sample.
pub trait DescriptiveStatistics: Send + Sync {
    fn mean(&self, data: &[f64]) -> Result<f64, ProviderError>;
    fn median(&self, data: &[f64]) -> Result<f64, ProviderError>;
    fn mode(&self, data: &[f64]) -> Result<f64, ProviderError>;
    fn stdev(&self, data: &[f64]) -> Result<f64, ProviderError>;
    fn variance(&self, data: &[f64]) -> Result<f64, ProviderError>;
}

/// An injected provider, or its absence plus the one-shot notice state.
pub struct Capability<T: ?Sized> {
    kind: CapabilityKind,
    provider: Option<Arc<T>>,
    state: Arc<CapabilityState>,
}

impl<T: ?Sized> Clone for Capability<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            provider: self.provider.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: ?Sized> Capability<T> {
    pub fn available(kind: CapabilityKind, provider: Arc<T>) -> Self {
        Self {
            kind,
            provider: Some(provider),
            state: Arc::new(CapabilityState::available()),
        }
    }

    pub fn unavailable(kind: CapabilityKind) -> Self {
        Self {
            kind,
            provider: None,
            state: Arc::new(CapabilityState::unavailable()),
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// The provider, without touching the notice state.
    pub fn provider(&self) -> Option<&T> {
        self.provider.as_deref()
    }

    /// The provider, or the outcome to surface because it is missing.
    pub fn require(&self) -> Result<&T, Outcome> {
        match &self.provider {
            Some(provider) => Ok(provider.as_ref()),
            None if self.state.take_notice() => Err(Outcome::Info(self.kind.notice().into())),
            None => Err(Outcome::Error(CalcError::Unsupported(self.kind))),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Capability<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("kind", &self.kind)
            .field("phase", &self.phase())
            .finish()
    }
}

//! A clipboard calculator.
//!
//! Short snippets are classified into a calculation domain (equations,
//! base conversions, dates, statistics, arithmetic) and evaluated into a
//! tagged [`Outcome`](calculator::Outcome).

pub mod calculator;
pub mod config;
pub mod display;
pub mod history;
pub mod monitor;

//! bad-apple-core: line-range delta debugging
//!
//! Finds the input lines that make an external command fail by bisecting
//! the line range and re-running the command on every half that still
//! fails.
//!
//! # Architecture
//!
//! ```text
//! input ─→ LineBuffer ─→ Reducer ──(range)──→ CommandRunner ─→ command <file>
//!                          ↑   └─ split ─┐        │
//!                          └─ work list ←┘        └─→ FailureSink (failing lines)
//! ```
//!
//! # Modules
//!
//! - `line_buffer`: one-shot spool of the input into a rereadable temp file
//! - `range`: half-open line ranges and the bisection rule
//! - `runner`: runs the command on one range, output routing, failure sinks
//! - `reducer`: depth-first work-list driver and the run report
//! - `config`: run options and log format
//! - `logging`: `tracing` dispatcher construction
//! - `error`: error types and remediation hints
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod line_buffer;
pub mod logging;
pub mod range;
pub mod reducer;
pub mod runner;

pub use config::ReduceOptions;
pub use error::{Error, Result};
pub use line_buffer::LineBuffer;
pub use range::LineRange;
pub use reducer::{ReductionReport, Reducer};
pub use runner::{
    CommandRunner, CommandTemplate, FailingLine, FailureSink, OutputPolicy, PredicateTester,
    RangeTester, TestOutcome, WriterSink,
};

//! Reduction driver: depth-first bisection over an explicit work list.
//!
//! The work list starts as the whole buffer. Each popped range is tested;
//! a failing range is split in two and both halves pushed back, a passing
//! range is dropped. Minimal ranges that fail are the result.
//!
//! Only failing halves are explored. A failure that needs lines from both
//! sides of a split point is lost once both halves pass on their own.

use serde::Serialize;
use tracing::Dispatch;

use crate::error::{Error, Result};
use crate::line_buffer::LineBuffer;
use crate::range::LineRange;
use crate::runner::{FailingLine, RangeTester};

/// Summary of one reduction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReductionReport {
    /// Lines in the input
    pub lines_total: usize,
    /// Number of command invocations
    pub tests_run: usize,
    /// True if any tested range, of any size, failed
    pub had_errors: bool,
    /// Minimal failing lines in discovery order
    pub failing_lines: Vec<FailingLine>,
    /// True if the run stopped early because our output was closed
    pub output_closed: bool,
}

impl ReductionReport {
    /// Process exit code for this result: 1 if anything failed, else 0.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(self.had_errors)
    }
}

/// Drives a [`RangeTester`] over a [`LineBuffer`].
pub struct Reducer<T> {
    tester: T,
    dispatch: Dispatch,
}

impl<T: RangeTester> Reducer<T> {
    /// Create a reducer logging to whatever dispatcher is current.
    pub fn new(tester: T) -> Self {
        Self {
            tester,
            dispatch: tracing::dispatcher::get_default(Dispatch::clone),
        }
    }

    /// Log through `dispatch` while running.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn tester(&self) -> &T {
        &self.tester
    }

    pub fn into_tester(self) -> T {
        self.tester
    }

    /// Reduce `buffer`. Tester errors abort the run and propagate.
    pub fn run(&mut self, buffer: &LineBuffer) -> Result<ReductionReport> {
        let dispatch = self.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || self.reduce(buffer))
    }

    fn reduce(&mut self, buffer: &LineBuffer) -> Result<ReductionReport> {
        let mut report = ReductionReport {
            lines_total: buffer.len(),
            ..ReductionReport::default()
        };
        let mut work: Vec<LineRange> = LineRange::full(buffer.len()).into_iter().collect();
        tracing::info!(lines = buffer.len(), "reduction started");

        while let Some(range) = work.pop() {
            let outcome = match self.tester.test(range, buffer) {
                Ok(outcome) => outcome,
                Err(Error::OutputClosed) => {
                    report.tests_run += 1;
                    report.had_errors = true;
                    report.output_closed = true;
                    tracing::info!(range = %range, "output closed, stopping");
                    break;
                }
                Err(err) => return Err(err),
            };
            report.tests_run += 1;
            if outcome.passed {
                continue;
            }

            report.had_errors = true;
            if let Some(halves) = range.split() {
                work.extend(halves);
            }
            if let Some(line) = outcome.failing_line {
                report.failing_lines.push(line);
            }
        }

        tracing::info!(
            tests_run = report.tests_run,
            failing_lines = report.failing_lines.len(),
            had_errors = report.had_errors,
            "reduction finished"
        );
        Ok(report)
    }
}

//! Test runner: run the command under test against one line range.
//!
//! Each test writes the range's lines to a fresh named temporary file,
//! appends that file's path to the command template and waits for the
//! command to exit. Exit code 0 passes; anything else (including death by
//! signal) fails. When a single-line range fails, that line is handed to the
//! runner's [`FailureSink`].

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::config::ReduceOptions;
use crate::error::{Error, Result};
use crate::line_buffer::LineBuffer;
use crate::range::LineRange;

/// The command under test: a program plus fixed leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandTemplate {
    /// Build a template from `program arg...`; an empty list is a usage error.
    pub fn from_args<I, A>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args.next().ok_or(Error::MissingCommand)?;
        Ok(Self {
            program,
            args: args.collect(),
        })
    }

    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// The process to run for one candidate file, its path appended last.
    #[must_use]
    pub fn command_for(&self, candidate: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(candidate);
        command
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Where the tested command's stdout and stderr go for one range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Discard both streams.
    Suppress,
    /// stdout to our stdout, stderr to our stderr.
    ForwardBoth,
    /// stdout and stderr both to our stderr.
    ForwardErrOnly,
}

impl OutputPolicy {
    /// Multi-line ranges are usually split further, so their output is
    /// dropped unless `show_multi_row_output` is set.
    #[must_use]
    pub fn for_range(range: LineRange, options: &ReduceOptions) -> Self {
        if !range.is_minimal() && !options.show_multi_row_output {
            Self::Suppress
        } else if options.stdout_to_stdout {
            Self::ForwardBoth
        } else {
            Self::ForwardErrOnly
        }
    }

    fn stdout(self) -> Stdio {
        match self {
            Self::Suppress => Stdio::null(),
            Self::ForwardBoth => Stdio::inherit(),
            Self::ForwardErrOnly => Stdio::from(io::stderr()),
        }
    }

    fn stderr(self) -> Stdio {
        match self {
            Self::Suppress => Stdio::null(),
            Self::ForwardBoth | Self::ForwardErrOnly => Stdio::inherit(),
        }
    }
}

/// A single input line that makes the command fail on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailingLine {
    /// 0-based line index in the input
    pub index: usize,
    /// Line text, trailing whitespace stripped, invalid UTF-8 replaced
    pub content: String,
}

impl FailingLine {
    fn from_raw(index: usize, raw: &[u8]) -> Self {
        Self {
            index,
            content: String::from_utf8_lossy(raw).trim_end().to_string(),
        }
    }
}

/// Receives failing lines as soon as they are found.
pub trait FailureSink {
    fn record(&mut self, line: &FailingLine) -> io::Result<()>;
}

/// Writes each failing line's content on its own line and flushes.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FailureSink for WriterSink<W> {
    fn record(&mut self, line: &FailingLine) -> io::Result<()> {
        writeln!(self.writer, "{}", line.content)?;
        self.writer.flush()
    }
}

impl FailureSink for Vec<FailingLine> {
    fn record(&mut self, line: &FailingLine) -> io::Result<()> {
        self.push(line.clone());
        Ok(())
    }
}

/// Result of testing one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub range: LineRange,
    /// `None` when the command was terminated by a signal
    pub exit_code: Option<i32>,
    pub passed: bool,
    /// Set only when a minimal range failed
    pub failing_line: Option<FailingLine>,
}

/// Anything that can decide whether a range of the buffer passes.
///
/// Errors are fatal to the whole reduction; a failing range is an
/// `Ok(TestOutcome { passed: false, .. })`.
pub trait RangeTester {
    fn test(&mut self, range: LineRange, buffer: &LineBuffer) -> Result<TestOutcome>;
}

/// Runs the command template against each range.
#[derive(Debug)]
pub struct CommandRunner<S> {
    template: CommandTemplate,
    options: ReduceOptions,
    sink: S,
}

impl<S: FailureSink> CommandRunner<S> {
    pub fn new(template: CommandTemplate, options: ReduceOptions, sink: S) -> Self {
        Self {
            template,
            options,
            sink,
        }
    }

    #[must_use]
    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: FailureSink> RangeTester for CommandRunner<S> {
    fn test(&mut self, range: LineRange, buffer: &LineBuffer) -> Result<TestOutcome> {
        let policy = OutputPolicy::for_range(range, &self.options);
        tracing::debug!(range = %range, lines = range.len(), ?policy, "testing range");

        let candidate = tempfile::Builder::new()
            .prefix("bad-apple-")
            .suffix(".lines")
            .tempfile()?;
        {
            let mut writer = BufWriter::new(candidate.as_file());
            buffer.write_range(range, &mut writer)?;
            writer.flush()?;
        }

        let mut command = self.template.command_for(candidate.path());
        command
            .stdin(Stdio::null())
            .stdout(policy.stdout())
            .stderr(policy.stderr());
        tracing::debug!(?command, "executing");

        let status = command.status().map_err(|source| Error::Spawn {
            program: self.template.program.clone(),
            source,
        })?;
        candidate.close()?;

        let exit_code = status.code();
        let passed = status.success();
        match exit_code {
            Some(code) => tracing::debug!(range = %range, exit_code = code, "command exited"),
            None => tracing::debug!(range = %range, %status, "command terminated by signal"),
        }

        let failing_line = if !passed && range.is_minimal() {
            let line = FailingLine::from_raw(range.start(), &buffer.line(range.start())?);
            tracing::info!(line = line.index + 1, "failing line found");
            self.sink.record(&line).map_err(|err| {
                if err.kind() == io::ErrorKind::BrokenPipe {
                    Error::OutputClosed
                } else {
                    Error::Io(err)
                }
            })?;
            Some(line)
        } else {
            None
        };

        Ok(TestOutcome {
            range,
            exit_code,
            passed,
            failing_line,
        })
    }
}

/// In-process tester for library callers and tests.
///
/// `passes` receives exactly the bytes a command would find in its
/// candidate file. Every tested range is remembered in order.
#[derive(Debug)]
pub struct PredicateTester<F> {
    passes: F,
    tested: Vec<LineRange>,
}

impl<F: FnMut(&[u8]) -> bool> PredicateTester<F> {
    pub fn new(passes: F) -> Self {
        Self {
            passes,
            tested: Vec::new(),
        }
    }

    /// Ranges tested so far, in test order.
    #[must_use]
    pub fn tested(&self) -> &[LineRange] {
        &self.tested
    }
}

impl<F: FnMut(&[u8]) -> bool> RangeTester for PredicateTester<F> {
    fn test(&mut self, range: LineRange, buffer: &LineBuffer) -> Result<TestOutcome> {
        let mut bytes = Vec::new();
        buffer.write_range(range, &mut bytes)?;
        self.tested.push(range);

        let passed = (self.passes)(&bytes);
        let failing_line =
            (!passed && range.is_minimal()).then(|| FailingLine::from_raw(range.start(), &bytes));
        Ok(TestOutcome {
            range,
            exit_code: Some(i32::from(!passed)),
            passed,
            failing_line,
        })
    }
}

//! Error types for bad-apple-core

use std::ffi::OsString;
use std::fmt::Write;
use thiserror::Error;

use crate::logging::LogError;

/// Remediation command for resolving an error
#[derive(Debug, Clone)]
pub struct RemediationCommand {
    /// Short label describing the command purpose
    pub label: String,
    /// Command to run
    pub command: String,
}

/// Actionable remediation guidance for a fatal error
#[derive(Debug, Clone)]
pub struct Remediation {
    /// One-line summary of how to fix the issue
    pub summary: String,
    /// Suggested commands to diagnose the issue
    pub commands: Vec<RemediationCommand>,
    /// Additional alternative guidance
    pub alternatives: Vec<String>,
}

impl Remediation {
    /// Create a new remediation with a summary
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commands: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Add a diagnostic command
    #[must_use]
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.push(RemediationCommand {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    /// Add an alternative suggestion
    #[must_use]
    pub fn alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Render remediation text for human-readable output
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "To fix:");
        let _ = writeln!(output, "  {}", self.summary);

        if !self.commands.is_empty() {
            let _ = writeln!(output, "  Commands:");
            for cmd in &self.commands {
                let _ = writeln!(output, "    - {}: {}", cmd.label, cmd.command);
            }
        }

        if !self.alternatives.is_empty() {
            let _ = writeln!(output, "  Alternatives:");
            for alt in &self.alternatives {
                let _ = writeln!(output, "    - {alt}");
            }
        }

        output
    }
}

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bad-apple-core.
///
/// A command that runs and exits nonzero is never an error; it is a
/// [`crate::runner::TestOutcome`] with `passed == false`.
#[derive(Error, Debug)]
pub enum Error {
    /// No command to run was supplied
    #[error("missing application to execute")]
    MissingCommand,

    /// The command under test could not be started at all
    #[error("failed to execute {}", program.to_string_lossy())]
    Spawn {
        program: OsString,
        #[source]
        source: std::io::Error,
    },

    /// The line buffer holds fewer lines than a range asked for
    #[error("line range [{start}, {end}) is out of bounds for {len} buffered lines")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    /// The reader of our stdout went away while failing lines were being reported
    #[error("output closed before the reduction finished")]
    OutputClosed,

    /// I/O errors (line buffer, per-range files, output sinks)
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Logging setup errors
    #[error("logging setup failed")]
    Logging(#[from] LogError),
}

impl Error {
    /// Return remediation guidance when available.
    #[must_use]
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Self::MissingCommand => Some(
                Remediation::new("Pass the command to test after `--`.")
                    .command("Example", "bad-apple -a input.txt -- ./check.sh"),
            ),
            Self::Spawn { program, source } => {
                let program = program.to_string_lossy();
                let summary = match source.kind() {
                    std::io::ErrorKind::NotFound => {
                        format!("`{program}` was not found. Check the path or PATH.")
                    }
                    std::io::ErrorKind::PermissionDenied => {
                        format!("`{program}` is not executable. Check its permissions.")
                    }
                    _ => format!("`{program}` could not be started."),
                };
                Some(
                    Remediation::new(summary)
                        .command("Locate", format!("command -v {program}"))
                        .alternative("Wrap scripts in an interpreter, e.g. `-- sh ./check.sh`."),
                )
            }
            Self::RangeOutOfBounds { .. } | Self::OutputClosed => None,
            Self::Io(_) => Some(
                Remediation::new(
                    "Check that the input, temporary files and output are accessible.",
                )
                .alternative("Set TMPDIR to a writable directory with free space."),
            ),
            Self::Logging(_) => Some(
                Remediation::new("Check the log file path and RUST_LOG value.")
                    .alternative("Omit --log-file to log to stderr only."),
            ),
        }
    }
}

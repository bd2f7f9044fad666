//! bad-apple CLI
//!
//! Output the lines of a file that make an application fail.
//!
//! ```text
//! bad-apple [-v...] [-s] [-m] [-a FILE] [--] COMMAND [ARGS...]
//! ```
//!
//! Each candidate range is written to a temporary file whose path is
//! appended to `COMMAND ARGS...`. Failing lines go to stdout, one per line;
//! logs and forwarded command output go to stderr.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use bad_apple_core::config::LogFormat;
use bad_apple_core::logging::{self, LogConfig};
use bad_apple_core::{
    CommandRunner, CommandTemplate, LineBuffer, ReduceOptions, Reducer, WriterSink,
};
use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bad-apple")]
#[command(version)]
#[command(
    about = "Output the lines of a file that an application could not handle.",
    long_about = "Output the lines of a file that an application could not handle.\n\n\
        The input is bisected: COMMAND is run with a temporary file holding a \
        range of lines appended as its last argument. Ranges on which it exits \
        nonzero are split in half and retried until single failing lines remain."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug with every tested range)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Forward the command's stdout to stdout instead of stderr
    #[arg(short = 's', long)]
    stdout_to_stdout: bool,

    /// Show command output for ranges of more than one line too
    #[arg(short = 'm', long)]
    show_multi_row_output: bool,

    /// Read lines from FILE instead of standard input
    #[arg(short = 'a', long, value_name = "FILE", default_value = "-")]
    arg_file: PathBuf,

    /// Log format
    #[arg(long, env = "BAD_APPLE_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, env = "BAD_APPLE_LOG_FILE", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Result format: failing lines as found, or one JSON report at the end
    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Plain,
        conflicts_with = "stdout_to_stdout"
    )]
    format: OutputFormat,

    /// Command to run; the candidate file is appended as its last argument
    #[arg(required = true, trailing_var_arg = true, value_name = "COMMAND")]
    command: Vec<OsString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let log_config = LogConfig {
        format: cli.log_format,
        file: cli.log_file.clone(),
        ..LogConfig::for_verbosity(cli.verbose)
    };
    let dispatch = logging::build_dispatch(&log_config)?;

    let template = CommandTemplate::from_args(cli.command.iter().cloned())?;
    let options = ReduceOptions {
        stdout_to_stdout: cli.stdout_to_stdout,
        show_multi_row_output: cli.show_multi_row_output,
    };

    let buffer = tracing::dispatcher::with_default(&dispatch, || {
        tracing::info!(input = %cli.arg_file.display(), command = %template, "reading input");
        read_input(&cli.arg_file)
    })?;

    match cli.format {
        OutputFormat::Plain => {
            let runner = CommandRunner::new(template, options, WriterSink::new(io::stdout()));
            let mut reducer = Reducer::new(runner).with_dispatch(dispatch);
            let report = reducer.run(&buffer)?;
            Ok(report.exit_code())
        }
        OutputFormat::Json => {
            let runner = CommandRunner::new(template, options, WriterSink::new(io::sink()));
            let mut reducer = Reducer::new(runner).with_dispatch(dispatch);
            let report = reducer.run(&buffer)?;
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
            Ok(report.exit_code())
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<LineBuffer> {
    if path == Path::new("-") {
        return Ok(LineBuffer::build(io::stdin().lock())?);
    }
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    LineBuffer::build(BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))
}

fn report_error(err: &anyhow::Error) {
    eprintln!("bad-apple: {err:#}");
    let remediation = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<bad_apple_core::Error>())
        .and_then(bad_apple_core::Error::remediation);
    if let Some(remediation) = remediation {
        eprint!("{}", remediation.render_plain());
    }
}

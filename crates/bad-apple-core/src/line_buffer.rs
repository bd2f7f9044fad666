//! Seekable, line-addressable copy of the input.
//!
//! The input (usually stdin) can only be read once, but every tested range
//! needs to slice it again. [`LineBuffer`] spools the stream into an
//! anonymous temporary file once and re-scans it from the start for each
//! range. The file is unlinked on creation, so it disappears when the buffer
//! is dropped on every exit path.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};

use crate::error::{Error, Result};
use crate::range::LineRange;

/// Immutable spool of raw input lines.
///
/// A line ends after a `\n` byte; a trailing unterminated line still counts.
/// Bytes are stored verbatim, `\r\n` endings included.
///
/// Reads seek the shared file handle, so a buffer must not be read from
/// two threads at once. The reducer is single-threaded.
#[derive(Debug)]
pub struct LineBuffer {
    file: File,
    len: usize,
    bytes: u64,
}

impl LineBuffer {
    /// Spool `source` into a fresh temporary file.
    pub fn build<R: BufRead>(mut source: R) -> Result<Self> {
        let file = tempfile::tempfile()?;
        let mut writer = BufWriter::new(&file);
        let mut line = Vec::new();
        let mut len = 0usize;
        let mut bytes = 0u64;

        loop {
            line.clear();
            let read = source.read_until(b'\n', &mut line)?;
            if read == 0 {
                break;
            }
            writer.write_all(&line)?;
            len += 1;
            bytes += read as u64;
        }
        writer.flush()?;
        drop(writer);

        tracing::debug!(lines = len, bytes, "input spooled");
        Ok(Self { file, len, bytes })
    }

    /// Number of lines held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total size of the spooled input in bytes.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        self.bytes
    }

    fn rewind(&self) -> Result<BufReader<&File>> {
        let mut handle = &self.file;
        handle.seek(SeekFrom::Start(0))?;
        Ok(BufReader::new(handle))
    }

    /// Copy exactly the lines of `range` to `dest`, returning bytes written.
    pub fn write_range<W: Write>(&self, range: LineRange, dest: &mut W) -> Result<u64> {
        if range.end() > self.len {
            return Err(Error::RangeOutOfBounds {
                start: range.start(),
                end: range.end(),
                len: self.len,
            });
        }

        let mut reader = self.rewind()?;
        let mut line = Vec::new();
        let mut written = 0u64;
        for index in 0..range.end() {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("line buffer truncated at line {index}"),
                )
                .into());
            }
            if index >= range.start() {
                dest.write_all(&line)?;
                written += read as u64;
            }
        }
        Ok(written)
    }

    /// Raw bytes of line `index`, terminator included.
    pub fn line(&self, index: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_range(LineRange::single(index), &mut out)?;
        Ok(out)
    }
}

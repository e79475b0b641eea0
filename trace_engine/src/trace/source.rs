use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::error::{TraceError, TraceResult};

/// Line-oriented byte source backing a trace store.
///
/// The store reopens the source from the beginning on every window reload,
/// so implementations must hand out a fresh reader each time.
pub trait TraceSource: Send + Sync + 'static {
    /// Human readable origin, used in logs and errors.
    fn path(&self) -> &Path;

    /// Open a reader positioned at the first byte.
    fn open(&self) -> TraceResult<Box<dyn BufRead + Send>>;

    /// Count lines with the same splitting rule as [`LineReader`].
    fn count_lines(&self) -> TraceResult<usize> {
        let mut reader = LineReader::new(self.open()?);
        let mut count = 0;
        while reader
            .skip_line()
            .map_err(|err| TraceError::io(self.path(), err))?
        {
            count += 1;
        }
        Ok(count)
    }
}

/// Trace file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TraceSource for FileSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> TraceResult<Box<dyn BufRead + Send>> {
        let file = File::open(&self.path).map_err(|err| TraceError::io(&self.path, err))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn count_lines(&self) -> TraceResult<usize> {
        let file = File::open(&self.path).map_err(|err| TraceError::io(&self.path, err))?;
        let len = file
            .metadata()
            .map_err(|err| TraceError::io(&self.path, err))?
            .len();
        // Zero-length mappings are rejected by the OS.
        if len == 0 {
            return Ok(0);
        }

        // SAFETY: the trace is assumed append-only while open; the mapping is
        // read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|err| TraceError::io(&self.path, err))?;
        Ok(count_newline_terminated(&mmap))
    }
}

/// Number of lines in `bytes`, counting a final unterminated line.
pub(crate) fn count_newline_terminated(bytes: &[u8]) -> usize {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    match bytes.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

/// Splits a reader into lines, tolerating `\r\n` endings and invalid UTF-8.
pub(crate) struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(512),
        }
    }

    /// Consume one line without decoding it. Returns `false` at end of input.
    pub(crate) fn skip_line(&mut self) -> io::Result<bool> {
        self.buf.clear();
        Ok(self.inner.read_until(b'\n', &mut self.buf)? > 0)
    }

    /// Read the next line with its terminator removed.
    pub(crate) fn next_line(&mut self) -> io::Result<Option<String>> {
        if !self.skip_line()? {
            return Ok(None);
        }
        let mut line = &self.buf[..];
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest;
        }
        if let Some(rest) = line.strip_suffix(b"\r") {
            line = rest;
        }
        Ok(Some(String::from_utf8_lossy(line).into_owned()))
    }
}

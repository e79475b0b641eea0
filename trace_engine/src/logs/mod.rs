//! Step-indexed call and memory logs.
//!
//! Both logs share one layout: a header line carrying a decimal step,
//! followed by zero or more `|`-delimited memory dump rows that belong to it.
//! Entries are grouped by step; lookups fall back to the nearest earlier
//! step because events are sparse relative to executed instructions.

pub mod call;
pub mod error;
pub mod memory;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::trace::source::LineReader;

pub use call::CallLogEntry;
pub use error::{HeaderError, LogError, LogResult};
pub use memory::{AccessKind, MemoryLogEntry};

/// Fields common to every auxiliary log entry.
pub trait LogEntry {
    fn step(&self) -> u64;
    /// Header line as read from the file.
    fn raw(&self) -> &str;
    fn dump(&self) -> &[String];
}

/// Header grammar of one log kind.
pub(crate) trait LogFormat {
    type Entry: LogEntry;

    const NAME: &'static str;

    /// Cheap test for lines that start a new entry.
    fn is_header(line: &str) -> bool;

    fn parse_header(line: &str) -> Result<Self::Entry, HeaderError>;

    fn push_dump_row(entry: &mut Self::Entry, row: String);
}

/// Counters from parsing one log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub entries: usize,
    pub malformed_headers: usize,
    /// Dump rows with no valid header before them.
    pub orphan_rows: usize,
    pub ignored_lines: usize,
}

/// Entries grouped by step, in file order within a step.
#[derive(Debug, Clone)]
pub struct StepIndex<E> {
    by_step: BTreeMap<u64, Vec<E>>,
    entry_count: usize,
}

impl<E> Default for StepIndex<E> {
    fn default() -> Self {
        Self {
            by_step: BTreeMap::new(),
            entry_count: 0,
        }
    }
}

impl<E: LogEntry> StepIndex<E> {
    fn push(&mut self, entry: E) {
        self.by_step.entry(entry.step()).or_default().push(entry);
        self.entry_count += 1;
    }
}

impl<E> StepIndex<E> {
    /// Entries at `step`, or at the greatest recorded step below it.
    pub fn lookup(&self, step: u64) -> &[E] {
        self.by_step
            .range(..=step)
            .next_back()
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or(&[])
    }

    /// Entries recorded at exactly `step`.
    pub fn exact(&self, step: u64) -> Option<&[E]> {
        self.by_step.get(&step).map(Vec::as_slice)
    }

    pub fn steps(&self) -> impl Iterator<Item = u64> + '_ {
        self.by_step.keys().copied()
    }

    /// Number of distinct steps.
    pub fn len(&self) -> usize {
        self.by_step.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.by_step.is_empty()
    }
}

pub(crate) fn parse_log<F: LogFormat>(
    reader: impl BufRead,
) -> std::io::Result<(StepIndex<F::Entry>, LoadStats)> {
    let mut lines = LineReader::new(reader);
    let mut index = StepIndex::default();
    let mut stats = LoadStats::default();
    let mut current: Option<F::Entry> = None;
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line()? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        if F::is_header(&line) {
            if let Some(entry) = current.take() {
                index.push(entry);
            }
            match F::parse_header(&line) {
                Ok(entry) => current = Some(entry),
                Err(err) => {
                    debug!(log = F::NAME, line = line_no, error = %err, "Skipping malformed header");
                    stats.malformed_headers += 1;
                }
            }
        } else if line.contains('|') {
            match current.as_mut() {
                Some(entry) => F::push_dump_row(entry, line),
                None => stats.orphan_rows += 1,
            }
        } else {
            stats.ignored_lines += 1;
        }
    }

    if let Some(entry) = current.take() {
        index.push(entry);
    }
    stats.entries = index.entry_count();

    Ok((index, stats))
}

fn read_log<F: LogFormat>(path: &Path) -> LogResult<(StepIndex<F::Entry>, LoadStats)> {
    let file = File::open(path).map_err(|err| LogError::io(path, err))?;
    let (index, stats) =
        parse_log::<F>(BufReader::new(file)).map_err(|err| LogError::io(path, err))?;

    info!(
        log = F::NAME,
        path = %path.display(),
        entries = stats.entries,
        steps = index.len(),
        malformed_headers = stats.malformed_headers,
        "Loaded auxiliary log",
    );
    Ok((index, stats))
}

/// Call and memory logs for one trace.
///
/// Populated while a session opens and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct AuxiliaryLogStore {
    calls: StepIndex<CallLogEntry>,
    memory: StepIndex<MemoryLogEntry>,
}

impl AuxiliaryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the call index with the contents of `path`.
    pub fn load_call_log(&mut self, path: &Path) -> LogResult<LoadStats> {
        let (index, stats) = read_log::<call::CallLog>(path)?;
        self.calls = index;
        Ok(stats)
    }

    /// Replace the memory index with the contents of `path`.
    pub fn load_memory_log(&mut self, path: &Path) -> LogResult<LoadStats> {
        let (index, stats) = read_log::<memory::MemoryLog>(path)?;
        self.memory = index;
        Ok(stats)
    }

    pub fn calls(&self) -> &StepIndex<CallLogEntry> {
        &self.calls
    }

    pub fn memory(&self) -> &StepIndex<MemoryLogEntry> {
        &self.memory
    }

    pub fn lookup_calls(&self, step: u64) -> &[CallLogEntry] {
        self.calls.lookup(step)
    }

    pub fn lookup_memory(&self, step: u64) -> &[MemoryLogEntry] {
        self.memory.lookup(step)
    }
}

use std::sync::Arc;

use tracing::debug;

use super::error::{TraceError, TraceResult};
use super::record::{parse_line, TraceRecord};
use super::source::{LineReader, TraceSource};

pub const DEFAULT_WINDOW_SIZE: usize = 2000;
pub const DEFAULT_RELOAD_MARGIN: usize = 100;

/// Sizing of the in-memory window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Maximum number of lines held in memory.
    pub window_size: usize,
    /// Distance from a window edge at which stepping prefetches a new window.
    pub reload_margin: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            reload_margin: DEFAULT_RELOAD_MARGIN,
        }
    }
}

impl WindowConfig {
    pub fn validate(&self) -> TraceResult<()> {
        if self.window_size == 0 {
            return Err(TraceError::invalid_config("window_size must be positive"));
        }
        Ok(())
    }
}

/// Half-open line range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowBounds {
    pub start: usize,
    pub end: usize,
}

impl WindowBounds {
    /// Window of at most `window_size` lines around `center`, clamped to `[0, total)`.
    pub fn centered(center: usize, window_size: usize, total: usize) -> Self {
        let start = center
            .saturating_sub(window_size / 2)
            .min(total.saturating_sub(window_size));
        let end = start.saturating_add(window_size).min(total);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line < self.end
    }

    pub fn midpoint(&self) -> usize {
        self.start + self.len() / 2
    }
}

/// Immutable snapshot of materialized trace lines.
///
/// `None` entries are lines inside the window that failed to parse.
#[derive(Debug, Default)]
pub struct TraceWindow {
    bounds: WindowBounds,
    records: Vec<Option<Arc<TraceRecord>>>,
    malformed: usize,
}

impl TraceWindow {
    pub fn bounds(&self) -> WindowBounds {
        self.bounds
    }

    /// `None` when `line` is outside the window, `Some(None)` when it is
    /// inside but malformed.
    pub fn get(&self, line: usize) -> Option<Option<&Arc<TraceRecord>>> {
        if !self.bounds.contains(line) {
            return None;
        }
        self.records.get(line - self.bounds.start).map(Option::as_ref)
    }

    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    pub fn parsed_count(&self) -> usize {
        self.records.len() - self.malformed
    }

    /// Scan `source` from its first line, parsing only lines in `bounds`.
    pub(crate) fn load(source: &dyn TraceSource, bounds: WindowBounds) -> TraceResult<Self> {
        let mut reader = LineReader::new(source.open()?);
        let io_err = |err| TraceError::io(source.path(), err);

        for _ in 0..bounds.start {
            if !reader.skip_line().map_err(io_err)? {
                break;
            }
        }

        let mut records = Vec::with_capacity(bounds.len());
        let mut malformed = 0;
        for line_no in bounds.start..bounds.end {
            let Some(line) = reader.next_line().map_err(io_err)? else {
                break;
            };
            match parse_line(&line) {
                Ok(record) => records.push(Some(Arc::new(record))),
                Err(err) => {
                    debug!(line = line_no + 1, error = %err, "Skipping malformed trace line");
                    malformed += 1;
                    records.push(None);
                }
            }
        }

        // A source shorter than expected yields a shorter window.
        let bounds = WindowBounds {
            start: bounds.start,
            end: bounds.start + records.len(),
        };

        Ok(Self {
            bounds,
            records,
            malformed,
        })
    }
}

//! A trace opened together with its companion logs.
//!
//! Companion logs live next to the trace file (`bl.log` for calls, `rw.log`
//! for memory accesses by default). Either may be missing; that is reported
//! as a warning and the session still opens.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::logs::{AuxiliaryLogStore, CallLogEntry, LoadStats, LogError, MemoryLogEntry};
use crate::registers::{ChangedRegisters, RegisterChangeTracker};
use crate::trace::{LineFetch, TraceRecord, TraceResult, WindowConfig, WindowedTraceStore};

pub const DEFAULT_CALL_LOG_NAME: &str = "bl.log";
pub const DEFAULT_MEMORY_LOG_NAME: &str = "rw.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub window: WindowConfig,
    pub call_log_name: String,
    pub memory_log_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            call_log_name: DEFAULT_CALL_LOG_NAME.to_string(),
            memory_log_name: DEFAULT_MEMORY_LOG_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanionKind {
    Call,
    Memory,
}

/// Expected locations of the companion logs for a trace file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionPaths {
    pub call: PathBuf,
    pub memory: PathBuf,
}

impl CompanionPaths {
    /// Companions are probed next to every trace, whatever its file name.
    /// Absent files only produce warnings when the session opens.
    pub fn discover(trace_path: &Path, config: &SessionConfig) -> Self {
        let dir = trace_path.parent().unwrap_or_else(|| Path::new(""));
        Self {
            call: dir.join(&config.call_log_name),
            memory: dir.join(&config.memory_log_name),
        }
    }
}

/// Parse counters of the companion logs that loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompanionStats {
    pub call: Option<LoadStats>,
    pub memory: Option<LoadStats>,
}

/// A companion log that could not be loaded.
#[derive(Debug)]
pub struct LoadWarning {
    pub kind: CompanionKind,
    pub error: LogError,
}

/// Everything the presentation layer shows for one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepView<'a> {
    pub line: usize,
    #[serde(serialize_with = "serialize_record")]
    pub record: Arc<TraceRecord>,
    pub calls: &'a [CallLogEntry],
    pub memory: &'a [MemoryLogEntry],
    #[serde(serialize_with = "serialize_changed")]
    pub changed: ChangedRegisters,
}

fn serialize_record<S: serde::Serializer>(
    record: &Arc<TraceRecord>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    record.as_ref().serialize(serializer)
}

fn serialize_changed<S: serde::Serializer>(
    changed: &ChangedRegisters,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(changed.iter())
}

pub struct TraceSession {
    store: WindowedTraceStore,
    logs: AuxiliaryLogStore,
    tracker: RegisterChangeTracker,
    companions: CompanionPaths,
    log_stats: CompanionStats,
}

impl TraceSession {
    /// Open `trace_path` and whichever companion logs are present.
    ///
    /// Only a failure to open the trace itself is an error.
    pub fn open(
        trace_path: impl AsRef<Path>,
        config: &SessionConfig,
    ) -> TraceResult<(Self, Vec<LoadWarning>)> {
        let trace_path = trace_path.as_ref();
        let store = WindowedTraceStore::open(trace_path, config.window)?;
        let companions = CompanionPaths::discover(trace_path, config);

        let mut logs = AuxiliaryLogStore::new();
        let mut warnings = Vec::new();
        let mut log_stats = CompanionStats::default();
        match logs.load_call_log(&companions.call) {
            Ok(stats) => log_stats.call = Some(stats),
            Err(error) => warnings.push(LoadWarning {
                kind: CompanionKind::Call,
                error,
            }),
        }
        match logs.load_memory_log(&companions.memory) {
            Ok(stats) => log_stats.memory = Some(stats),
            Err(error) => warnings.push(LoadWarning {
                kind: CompanionKind::Memory,
                error,
            }),
        }
        for warning in &warnings {
            warn!(kind = ?warning.kind, error = %warning.error, "Companion log not loaded");
        }

        let session = Self {
            store,
            logs,
            tracker: RegisterChangeTracker::new(),
            companions,
            log_stats,
        };
        Ok((session, warnings))
    }

    pub fn store(&self) -> &WindowedTraceStore {
        &self.store
    }

    pub fn logs(&self) -> &AuxiliaryLogStore {
        &self.logs
    }

    pub fn companions(&self) -> &CompanionPaths {
        &self.companions
    }

    /// Skipped-line counters per loaded companion; `None` when it was missing.
    pub fn log_stats(&self) -> CompanionStats {
        self.log_stats
    }

    pub fn tracker_mut(&mut self) -> &mut RegisterChangeTracker {
        &mut self.tracker
    }

    /// Build the view for the cursor line.
    ///
    /// The tracker only advances when the line is materialized; otherwise the
    /// raw fetch outcome is returned so the caller can retry later.
    pub fn view_current(&mut self) -> Result<StepView<'_>, LineFetch> {
        let line = self.store.cursor();
        let record = match self.store.get_line(line) {
            LineFetch::Record(record) => record,
            other => return Err(other),
        };

        let changed = self.tracker.update(&record);
        let step = u64::from(record.step);
        Ok(StepView {
            line,
            calls: self.logs.lookup_calls(step),
            memory: self.logs.lookup_memory(step),
            changed,
            record,
        })
    }
}

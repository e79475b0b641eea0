//! Windowed navigation over large CPU execution traces, with call and memory
//! log context for each step.

pub mod app;
pub mod logs;
pub mod registers;
pub mod session;
pub mod trace;

pub use logs::{AuxiliaryLogStore, CallLogEntry, MemoryLogEntry};
pub use registers::{ChangedRegisters, RegisterChangeTracker};
pub use session::{SessionConfig, StepView, TraceSession};
pub use trace::{LineFetch, TraceError, TraceRecord, WindowConfig, WindowedTraceStore};

pub mod error;
pub mod record;
pub mod source;
pub mod store;
pub mod window;

pub use error::{ParseError, TraceError, TraceField, TraceResult};
pub use record::{parse_line, TraceRecord, FIELD_COUNT, GPR_COUNT, TRACKED_REGISTER_COUNT};
pub use source::{FileSource, TraceSource};
pub use store::{LineFetch, ReloadEvent, ReloadRequest, ScanStats, WindowedTraceStore};
pub use window::{TraceWindow, WindowBounds, WindowConfig};

use std::{fmt, io, num::ParseIntError, path::PathBuf};

use thiserror::Error;

/// Names the trace field a parse failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceField {
    Step,
    Address,
    Offset,
    Register(u8),
    Sp,
    Pc,
}

impl fmt::Display for TraceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceField::Step => f.write_str("step"),
            TraceField::Address => f.write_str("address"),
            TraceField::Offset => f.write_str("offset"),
            TraceField::Register(index) => write!(f, "x{index}"),
            TraceField::Sp => f.write_str("sp"),
            TraceField::Pc => f.write_str("pc"),
        }
    }
}

/// Failure to classify a single trace line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid {field} value {value:?}: {source}")]
    Field {
        field: TraceField,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid window configuration: {0}")]
    InvalidConfig(String),

    #[error("no tokio runtime available for background reloads: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    #[error("window reload failed: {0}")]
    ReloadFailed(String),

    #[error("line {0} is in range but could not be materialized")]
    LineUnavailable(usize),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

pub type TraceResult<T> = Result<T, TraceError>;

impl TraceError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_config(details: impl fmt::Display) -> Self {
        Self::InvalidConfig(details.to_string())
    }
}

use std::{io, num::ParseIntError, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type LogResult<T> = Result<T, LogError>;

impl LogError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a header-like line was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("missing ':' after step")]
    MissingStep,

    #[error("invalid step {value:?}: {source}")]
    Step {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid address {value:?}: {source}")]
    Address {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid offset {value:?}: {source}")]
    Offset {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("malformed header: {0}")]
    Shape(&'static str),
}

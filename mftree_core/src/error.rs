//! Error types for mftree_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using mftree_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding a table or operating on the namespace.
#[derive(Error, Debug)]
pub enum Error {
    /// The table buffer ended in the middle of a record.
    #[error("Truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A record field is structurally invalid.
    #[error("Malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },

    /// Records are nested deeper than the decoder allows.
    #[error("Record nesting exceeds depth limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    /// A directory operation was applied to a file.
    #[error("Not a directory: {name}")]
    NotADirectory { name: String },

    /// A directory component could not be resolved.
    #[error("Not found: {name}")]
    NotFound { name: String },

    /// A name given for a new entry is unusable.
    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    /// Every entry id has been handed out.
    #[error("Entry id space exhausted")]
    IdSpaceExhausted,

    /// Child storage could not be allocated.
    #[error("Out of memory growing child storage to {requested} entries")]
    OutOfMemory { requested: usize },

    /// I/O error while loading a table file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a TruncatedInput error.
    pub fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        Error::TruncatedInput {
            offset,
            needed,
            available,
        }
    }

    /// Create a MalformedRecord error.
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            offset,
            reason: reason.into(),
        }
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(name: impl Into<String>) -> Self {
        Error::NotADirectory { name: name.into() }
    }

    /// Create a NotFound error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Error::NotFound { name: name.into() }
    }

    /// Create an InvalidName error.
    pub fn invalid_name(reason: impl Into<String>) -> Self {
        Error::InvalidName {
            reason: reason.into(),
        }
    }

    /// Create an Io error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the contents of the table itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::TruncatedInput { .. }
                | Error::MalformedRecord { .. }
                | Error::DepthLimitExceeded { .. }
        )
    }
}

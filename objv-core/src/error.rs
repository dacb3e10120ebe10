/// Error types for objv-core
use std::path::PathBuf;

use thiserror::Error;

/// Result type for objv-core operations
pub type Result<T> = std::result::Result<T, ObjError>;

/// Coarse failure class, the view exposed across the `has_error()` boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    EmptyModel,
}

/// Error types for OBJ loading
#[derive(Error, Debug)]
pub enum ObjError {
    /// Empty path supplied
    #[error("Invalid filename: path is empty")]
    InvalidPath,

    /// File could not be opened or read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exists but holds no bytes
    #[error("The file is empty: {path}")]
    EmptyFile { path: PathBuf },

    /// Input produced no lines at all
    #[error("Input contains no lines")]
    NoLines,

    /// Structurally malformed record
    #[error("Format error on line {line}: {reason}")]
    Format { line: usize, reason: String },

    /// No `v` records, so no geometry can be built
    #[error("Model declares no vertices")]
    EmptyModel,
}

impl ObjError {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        ObjError::Format {
            line,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ObjError::InvalidPath
            | ObjError::Io { .. }
            | ObjError::EmptyFile { .. }
            | ObjError::NoLines => ErrorKind::Io,
            ObjError::Format { .. } => ErrorKind::Format,
            ObjError::EmptyModel => ErrorKind::EmptyModel,
        }
    }
}

//! Error types shared by every stage of the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, analysing or exporting a corpus.
#[derive(Debug, Error)]
pub enum Error {
    /// Input could not be decoded as the expected structured document
    #[error("{source_name}: not a usable record collection: {reason}")]
    Format {
        /// File name or other label of the offending input
        source_name: String,
        /// What was wrong with it
        reason: String,
    },

    /// A record lacks a field every record must carry
    #[error("record #{index} has no '{field}' field")]
    MissingField {
        /// Position of the record in its collection
        index: usize,
        /// Name of the absent field
        field: &'static str,
    },

    /// Caller passed a value outside the accepted range
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading or writing a file failed
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path that was being accessed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV export failed
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Creates a `Format` error from any displayable cause.
    #[must_use]
    pub fn format(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Format {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an `Io` error bound to `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

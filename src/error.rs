use std::{error, io};
use thiserror::Error;

/// Error raised by the database driver, kept opaque so the loader works with any [`crate::Session`].
pub type DriverError = Box<dyn error::Error + Send + Sync + 'static>;

/// Coarse classification of a [`LoadError`], used for reporting and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IoFailure,
    MalformedInput,
    InvalidConfig,
    ConnectionFailure,
    StatementFailure,
    CleanupFailure,
}

#[derive(Error, Debug)]
pub enum LoadError {
    /// Reading the input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The delimited-text reader rejected the input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input parsed but cannot be loaded as-is (empty input, bad header, ragged row).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not connect to {target}: {source}")]
    Connection { target: String, source: DriverError },

    /// The server rejected a statement. `statement` is the text that was sent.
    #[error("statement failed: {source}\n  statement: {statement}")]
    Statement { statement: String, source: DriverError },

    /// The compensating drop failed after an earlier failure, so a partial table may remain.
    #[error("{original}; dropping the partially loaded table also failed: {cleanup}")]
    Cleanup {
        original: Box<LoadError>,
        cleanup: Box<LoadError>,
    },
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Io(_) => ErrorKind::IoFailure,
            LoadError::Csv(err) if err.is_io_error() => ErrorKind::IoFailure,
            LoadError::Csv(_) | LoadError::MalformedInput(_) => ErrorKind::MalformedInput,
            LoadError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            LoadError::Connection { .. } => ErrorKind::ConnectionFailure,
            LoadError::Statement { .. } => ErrorKind::StatementFailure,
            LoadError::Cleanup { .. } => ErrorKind::CleanupFailure,
        }
    }

    pub(crate) fn statement(statement: &str, source: impl Into<DriverError>) -> Self {
        LoadError::Statement {
            statement: statement.to_owned(),
            source: source.into(),
        }
    }
}

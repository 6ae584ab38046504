//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The key-value store itself could not be found
    #[display("store not found: {_0}")]
    StoreNotFound(#[error(not(source))] String),
    /// One or more requested keys are missing from the store; lists all of
    /// them, not just the first
    #[display("files not found: {}", _0.join(", "))]
    FilesNotFound(#[error(not(source))] Vec<String>),
    /// Key is not part of the source's configured file list
    #[display("file not found: {_0}")]
    FileNotFound(#[error(not(source))] String),
    /// The store returned no content (or empty content) for a key
    #[display("empty content for key: {_0}")]
    EmptyContent(#[error(not(source))] String),
    /// Key cannot be represented by the store
    #[display("invalid key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Stored value could not be decoded
    #[display("invalid value for key {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BackendError(_))
    }
}

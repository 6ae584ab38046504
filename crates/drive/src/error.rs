//! Drive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A remote document-storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote document-storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Folder (or parent folder) does not exist on the remote service. This
    /// is the "already gone" class that deletions treat as success.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied (permissions or credentials)
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Folder path or file name is not representable on the remote service
    #[display("invalid folder path: {_0}")]
    InvalidPath(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Network-related error (connection reset, DNS, etc.)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The remote service answered with a non-success status
    #[display("remote service rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(_) | Self::Network(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` for the "already gone" class of failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

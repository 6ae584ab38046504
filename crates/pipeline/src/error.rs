//! Pipeline Error Types
//!
//! Only operation-level failures surface here. Per-file and per-folder
//! failures are recorded as failed [`Record`](crate::Record)s instead.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an operation failure.
///
/// ### Operation Errors (the run continues with the next operation)
/// - [`ErrorKind::CreateFolder`]
/// - [`ErrorKind::Source`]
///
/// ### Fatal Errors
/// - [`ErrorKind::Sink`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The destination folder could not be created.
    #[display("could not create folder {folder}: {reason}")]
    CreateFolder { folder: String, reason: String },
    /// The file source failed to initialize (including missing files).
    #[display("file source {name} failed: {reason}")]
    Source { name: String, reason: String },
    /// A result record could not be emitted.
    #[display("could not emit result record")]
    Sink,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Fatal errors abort the whole run rather than one operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Sink)
    }
}

//! Operation executors and the batch runner.
//!
//! A [`Runner`] takes a validated [`ExecutionPlan`](kvdrive_config::ExecutionPlan)
//! and executes its operations in order against a
//! [`DriveClient`](kvdrive_drive::DriveClient). Every uploaded file and every
//! deleted folder produces exactly one [`Record`], emitted to a
//! [`ResultSink`] as soon as it completes.

pub mod error;
pub mod operation;
mod record;
mod runner;
mod sink;

pub use crate::record::{Detail, FOLDER_MISSING_NOTE, Record, Status};
pub use crate::runner::{DEFAULT_MAX_CONCURRENCY, FailedOperation, RunSummary, Runner};
pub use crate::sink::{JsonLinesSink, MemorySink, ResultSink, SinkHandle};

//! Operation executors.
//!
//! Each executor performs one operation of the plan, emits its records to the
//! sink and returns a [`Tally`] of them. An `Err` means the operation as a
//! whole could not run.

pub mod delete;
pub mod upload;

use crate::Record;
use crate::error::{ErrorKind, Result};
use crate::sink::SinkHandle;
use exn::ResultExt;
use kvdrive_drive::DriveHandle;
use kvdrive_storage::OpenerHandle;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Collaborators and limits shared by every operation of a run.
#[derive(Clone)]
pub struct Context {
    pub drive: DriveHandle,
    pub stores: OpenerHandle,
    pub sink: SinkHandle,
    /// Budget for one file's fetch and upload.
    pub file_timeout: Duration,
    /// Upper bound on files in flight within one upload operation.
    pub max_concurrency: NonZeroUsize,
}
impl Context {
    async fn emit(&self, record: &Record) -> Result<()> {
        self.sink.emit(record).await.or_raise(|| ErrorKind::Sink)
    }
}

/// Record counts for one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
}
impl Tally {
    fn count(&mut self, record: &Record) {
        if record.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

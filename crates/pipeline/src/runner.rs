//! The batch runner: drains an [`ExecutionPlan`] one operation at a time.

use crate::error::Result;
use crate::operation::{self, Context, Tally};
use crate::sink::SinkHandle;
use kvdrive_config::{DEFAULT_FILE_UPLOAD_TIMEOUT, ExecutionPlan, Operation, OperationType, Settings};
use kvdrive_drive::DriveHandle;
use kvdrive_storage::OpenerHandle;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::instrument;

/// Files in flight per upload operation when the settings leave it open.
pub const DEFAULT_MAX_CONCURRENCY: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// An operation that could not run at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedOperation {
    /// Position in the plan.
    pub index: usize,
    pub operation: OperationType,
    pub reason: String,
}

/// What a run did, in numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub operations: usize,
    /// Successful records across all operations.
    pub succeeded: usize,
    /// Failed records across all operations.
    pub failed: usize,
    pub failed_operations: Vec<FailedOperation>,
}
impl RunSummary {
    /// No failed record and no failed operation.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.failed_operations.is_empty()
    }

    fn add(&mut self, tally: Tally) {
        self.succeeded += tally.succeeded;
        self.failed += tally.failed;
    }
}

/// Executes plans against one drive, one set of stores and one sink.
///
/// Operations run strictly in plan order; each finishes (including all of
/// its file uploads) before the next starts. An operation that fails as a
/// whole is logged and listed in the [`RunSummary`], and the run moves on.
/// Only a fatal error, such as a sink that stops accepting records, ends
/// the run early.
pub struct Runner {
    ctx: Context,
}
impl Runner {
    pub fn new(drive: DriveHandle, stores: OpenerHandle, sink: SinkHandle) -> Self {
        Self {
            ctx: Context {
                drive,
                stores,
                sink,
                file_timeout: DEFAULT_FILE_UPLOAD_TIMEOUT,
                max_concurrency: DEFAULT_MAX_CONCURRENCY,
            },
        }
    }

    /// Apply the run-wide settings. An unset concurrency keeps the current one.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.ctx.file_timeout = settings.file_upload_timeout;
        if let Some(limit) = settings.file_uploading_max_concurrency {
            self.ctx.max_concurrency = limit;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.ctx.file_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.ctx.max_concurrency = limit;
        self
    }

    #[instrument(skip_all, fields(operations = plan.operations.len(), drive = %self.ctx.drive.name()))]
    pub async fn run(&self, plan: &ExecutionPlan) -> Result<RunSummary> {
        let mut summary = RunSummary {
            operations: plan.operations.len(),
            ..RunSummary::default()
        };
        if plan.is_empty() {
            tracing::info!("Nothing to do");
            return Ok(summary);
        }

        for (index, operation) in plan.operations.iter().enumerate() {
            tracing::info!(index, operation = %operation, "Starting operation");
            let outcome = match operation {
                Operation::Upload(upload) => operation::upload::execute(upload, &self.ctx).await,
                Operation::DeleteFolder(delete) => operation::delete::execute(delete, &self.ctx).await,
            };
            match outcome {
                Ok(tally) => summary.add(tally),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let reason = (*e).to_string();
                    tracing::error!(index, operation = %operation.kind(), error = %reason, "Operation failed");
                    summary.failed_operations.push(FailedOperation {
                        index,
                        operation: operation.kind(),
                        reason,
                    });
                },
            }
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            failed_operations = summary.failed_operations.len(),
            "Run finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySink;
    use kvdrive_drive::backend::MockDrive;
    use kvdrive_storage::MockStores;
    use std::sync::Arc;

    #[test]
    fn test_with_settings() {
        let settings = Settings {
            file_upload_timeout: Duration::from_secs(7),
            file_uploading_max_concurrency: NonZeroUsize::new(3),
            ..Settings::default()
        };
        let runner = Runner::new(
            Arc::new(MockDrive::default()),
            Arc::new(MockStores::default()),
            Arc::new(MemorySink::default()),
        )
        .with_settings(&settings);
        assert_eq!(runner.ctx.file_timeout, Duration::from_secs(7));
        assert_eq!(runner.ctx.max_concurrency.get(), 3);

        let runner = runner.with_settings(&Settings::default());
        assert_eq!(runner.ctx.file_timeout, DEFAULT_FILE_UPLOAD_TIMEOUT);
        assert_eq!(runner.ctx.max_concurrency.get(), 3);
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let sink = Arc::new(MemorySink::default());
        let runner = Runner::new(Arc::new(MockDrive::default()), Arc::new(MockStores::default()), sink.clone());
        let summary = runner.run(&ExecutionPlan::default()).await.unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(summary.is_clean());
        assert!(sink.records().await.is_empty());
    }

    #[test]
    fn test_summary_serialization() {
        let summary = RunSummary {
            operations: 2,
            succeeded: 3,
            failed: 1,
            failed_operations: vec![FailedOperation {
                index: 1,
                operation: OperationType::Upload,
                reason: "boom".to_string(),
            }],
        };
        assert!(!summary.is_clean());
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({
                "operations": 2,
                "succeeded": 3,
                "failed": 1,
                "failedOperations": [{ "index": 1, "operation": "upload-files-to-folder", "reason": "boom" }],
            })
        );
    }
}

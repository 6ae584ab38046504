//! Upload files from a source into a destination folder.

use super::{Context, Tally};
use crate::Record;
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use kvdrive_config::UploadOperation;
use kvdrive_drive::DriveHandle;
use kvdrive_storage::{FileRef, KeyValueStoreSource, OpenOptions, SourceHandle, SourceKind};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Run an upload operation.
///
/// Creates the destination folder, initializes the source (which fails the
/// operation if any file is missing), then uploads every file with bounded
/// concurrency. A failing file is recorded and never stops its siblings.
#[instrument(skip_all, fields(source = %operation.source.id_or_name, destination = %operation.destination))]
pub async fn execute(operation: &UploadOperation, ctx: &Context) -> Result<Tally> {
    let folder_id = ctx.drive.create_folder(&operation.destination).await.map_err(|e| {
        let reason = (*e).to_string();
        e.raise(ErrorKind::CreateFolder {
            folder: operation.destination.to_string(),
            reason,
        })
    })?;
    tracing::debug!(folder_id = %folder_id, "Destination folder ready");

    let source = file_source(operation, ctx);
    tracing::debug!(kind = %source.kind(), files = source.files().len(), "Initializing file source");
    source.initialize().await.map_err(|e| {
        let reason = (*e).to_string();
        e.raise(ErrorKind::Source {
            name: operation.source.id_or_name.clone(),
            reason,
        })
    })?;

    let mut tally = Tally::default();
    let mut records = std::pin::pin!(upload_files(ctx, &source, &folder_id));
    while let Some(record) = records.next().await {
        tally.count(&record?);
    }
    tracing::info!(succeeded = tally.succeeded, failed = tally.failed, "Upload finished");
    Ok(tally)
}

fn file_source(operation: &UploadOperation, ctx: &Context) -> SourceHandle {
    let source = &operation.source;
    match source.kind {
        SourceKind::KeyValueStore => Arc::new(KeyValueStoreSource::new(
            ctx.stores.clone(),
            source.id_or_name.clone(),
            OpenOptions {
                force_cloud: source.force_cloud,
            },
            source.files.clone(),
        )),
    }
}

/// Streams one emitted record per file. At most `max_concurrency` files are
/// in flight; each completion immediately starts the next pending file.
///
/// Records are emitted from within each file's future, so a slow sink never
/// stops the other in-flight files from being polled.
fn upload_files<'a>(
    ctx: &'a Context,
    source: &'a SourceHandle,
    folder_id: &'a str,
) -> impl Stream<Item = Result<Record>> + 'a {
    stream!({
        let mut pending: VecDeque<_> = source
            .files()
            .iter()
            .map(|file| async move {
                let record = upload_file(&ctx.drive, source, file, folder_id, ctx.file_timeout).await;
                ctx.emit(&record).await.map(|()| record)
            })
            .collect();
        let mut in_flight = FuturesUnordered::new();
        in_flight.extend(pending.drain(..ctx.max_concurrency.get().min(pending.len())));
        while let Some(record) = in_flight.next().await {
            // Pop-n-push, FIFO.
            if let Some(next) = pending.pop_front() {
                in_flight.push(next);
            }
            yield record;
        }
    })
}

/// Fetch and upload a single file. The timeout starts when the file does.
async fn upload_file(
    drive: &DriveHandle,
    source: &SourceHandle,
    file: &FileRef,
    folder_id: &str,
    timeout: Duration,
) -> Record {
    let work = async {
        let data = source.file_data(&file.key).await.map_err(|e| format!("could not read {}: {}", file.key, *e))?;
        let name = data.file_name.clone();
        drive.upload_file(data, folder_id).await.map_err(|e| format!("could not upload {name}: {}", *e))
    };
    match tokio::time::timeout(timeout, work).await {
        Ok(Ok(response)) => {
            tracing::debug!(key = %file.key, status = response.status, "Uploaded file");
            Record::uploaded(file.clone(), folder_id, response)
        },
        Ok(Err(error)) => {
            tracing::warn!(key = %file.key, error = %error, "Upload failed");
            Record::upload_failed(file.clone(), folder_id, vec![error])
        },
        Err(_) => {
            tracing::warn!(key = %file.key, timeout = ?timeout, "Upload timed out");
            let error = format!("timed out after {}s", timeout.as_secs_f64());
            Record::upload_failed(file.clone(), folder_id, vec![error])
        },
    }
}

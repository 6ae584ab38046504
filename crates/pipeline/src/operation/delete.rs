//! Delete a folder, treating an absent folder as already deleted.

use super::{Context, Tally};
use crate::Record;
use crate::error::Result;
use kvdrive_config::DeleteFolderOperation;
use tracing::instrument;

/// Run a delete operation, emitting exactly one record.
///
/// The folder is looked up first; a folder that does not exist is never sent
/// a delete. A "not found" answer to the delete itself (the folder vanished
/// in between) is folded into the same success-with-note record.
#[instrument(skip_all, fields(folder = %operation.folder))]
pub async fn execute(operation: &DeleteFolderOperation, ctx: &Context) -> Result<Tally> {
    let folder = operation.folder.to_string();
    let record = match ctx.drive.folder_id(&operation.folder).await {
        Ok(None) => {
            tracing::info!("Folder does not exist, nothing to delete");
            Record::folder_missing(folder)
        },
        Ok(Some(folder_id)) => match ctx.drive.delete_folder(&folder_id).await {
            Ok(response) => {
                tracing::info!(folder_id = %folder_id, "Deleted folder");
                Record::deleted(folder_id, response)
            },
            Err(e) if e.is_not_found() => {
                tracing::info!(folder_id = %folder_id, "Folder disappeared before it could be deleted");
                Record::folder_missing(folder_id)
            },
            Err(e) => {
                let error = (*e).to_string();
                tracing::warn!(folder_id = %folder_id, error = %error, "Delete failed");
                Record::delete_failed(folder_id, vec![error])
            },
        },
        Err(e) => {
            let error = format!("could not look up folder: {}", *e);
            tracing::warn!(error = %error, "Folder lookup failed");
            Record::delete_failed(folder, vec![error])
        },
    };

    let mut tally = Tally::default();
    tally.count(&record);
    ctx.emit(&record).await?;
    Ok(tally)
}

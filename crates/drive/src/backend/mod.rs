//! Remote document-storage client trait and implementations.
//!
//! This module defines the `DriveClient` trait, the narrow interface the
//! pipeline uses to talk to a document-storage service. Authentication,
//! transport, and any retry policy belong to the implementation.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalDrive;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockDrive, Upload};
use crate::error::Result;
use crate::{FileData, FolderPath, RemoteResponse};
use async_trait::async_trait;

/// Unified interface for remote document-storage services.
///
/// Implementations must be safe for concurrent independent calls; the
/// pipeline issues several uploads at once against one client and imposes no
/// locking of its own.
///
/// # Examples
///
/// ```no_run
/// use kvdrive_drive::{DriveClient, FolderPath, error::Result};
///
/// async fn ensure_and_delete(drive: &dyn DriveClient) -> Result<()> {
///     let folder = FolderPath::with_parent_name("team", Some("reports/q1".to_string()))?;
///     let id = drive.create_folder(&folder).await?;
///     assert_eq!(drive.folder_id(&folder).await?, Some(id.clone()));
///     drive.delete_folder(&id).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Name of the configured client (used for logging only).
    fn name(&self) -> &str;

    /// Create the folder, and every missing intermediate folder, returning
    /// its id.
    ///
    /// # Notes
    /// - Idempotent: an existing folder's id is returned without error.
    /// - An [`Anchor::Id`](crate::Anchor::Id) that does not exist is never
    ///   created; it fails with [`NotFound`](crate::error::ErrorKind::NotFound).
    async fn create_folder(&self, folder: &FolderPath) -> Result<String>;

    /// Look up the folder's id without creating anything. Returns `None`
    /// when any part of the path is missing.
    async fn folder_id(&self, folder: &FolderPath) -> Result<Option<String>>;

    /// Delete a folder (and its contents) by id.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the folder
    /// no longer exists, distinguishable from every other failure.
    async fn delete_folder(&self, folder_id: &str) -> Result<RemoteResponse>;

    /// Upload a file into the folder with the given id.
    async fn upload_file(&self, file: FileData, folder_id: &str) -> Result<RemoteResponse>;
}

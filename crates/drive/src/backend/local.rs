//! Local filesystem document store.
//!
//! Mirrors the remote service on a local directory: folders are directories
//! and a folder's id is its `/`-separated path relative to the root. Handy
//! for dry runs and for staging uploads before a real service is wired in.

use crate::error::{ErrorKind, Result};
use crate::{Anchor, DriveClient, FileData, FolderPath, RemoteResponse};
use async_trait::async_trait;
use serde_json::json;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem document store.
///
/// # Examples
///
/// ```no_run
/// use kvdrive_drive::backend::LocalDrive;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let drive = LocalDrive::new("staging", "/srv/kvdrive/drive")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalDrive {
    name: String,
    root: PathBuf,
}
impl LocalDrive {
    /// Create a new local document store rooted at an absolute directory,
    /// creating the directory if it does not exist yet.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root.display().to_string()));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root.display().to_string()));
            }
        } else {
            // Non-async: happens once at startup.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root.display().to_string()))?;
        }
        Ok(Self { name: name.into(), root })
    }

    /// Folder id (path relative to root) for a folder path.
    fn folder_key(folder: &FolderPath) -> String {
        let anchor = match folder.anchor() {
            Anchor::Id(id) | Anchor::Name(id) => id.as_str(),
        };
        match folder.relative_path() {
            Some(relative) => format!("{anchor}/{relative}"),
            None => anchor.to_string(),
        }
    }

    /// Absolute directory for a folder id. Ids are relative paths, so they
    /// get the same traversal checks as any other path.
    fn directory(&self, folder_id: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in folder_id.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\0') {
                exn::bail!(ErrorKind::InvalidPath(folder_id.to_string()));
            }
            path.push(segment);
        }
        Ok(path)
    }

    async fn is_dir(path: &Path) -> bool {
        fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
    }

    fn map_io_error(e: std::io::Error, what: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(what.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(what.to_string()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl DriveClient for LocalDrive {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_folder(&self, folder: &FolderPath) -> Result<String> {
        if let Anchor::Id(id) = folder.anchor()
            && !Self::is_dir(&self.directory(id)?).await
        {
            exn::bail!(ErrorKind::NotFound(id.clone()));
        }
        let folder_id = Self::folder_key(folder);
        let directory = self.directory(&folder_id)?;
        fs::create_dir_all(&directory).await.map_err(|e| Self::map_io_error(e, &folder_id))?;
        tracing::debug!(drive = %self.name, folder = %folder, folder_id = %folder_id, "Folder ready");
        Ok(folder_id)
    }

    async fn folder_id(&self, folder: &FolderPath) -> Result<Option<String>> {
        let folder_id = Self::folder_key(folder);
        Ok(Self::is_dir(&self.directory(&folder_id)?).await.then_some(folder_id))
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<RemoteResponse> {
        let directory = self.directory(folder_id)?;
        fs::remove_dir_all(&directory).await.map_err(|e| Self::map_io_error(e, folder_id))?;
        Ok(RemoteResponse::no_content())
    }

    async fn upload_file(&self, file: FileData, folder_id: &str) -> Result<RemoteResponse> {
        let directory = self.directory(folder_id)?;
        if !Self::is_dir(&directory).await {
            exn::bail!(ErrorKind::NotFound(folder_id.to_string()));
        }
        let name = &file.file_name;
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
            exn::bail!(ErrorKind::InvalidPath(name.clone()));
        }
        fs::write(directory.join(name), &file.content).await.map_err(|e| Self::map_io_error(e, name))?;
        Ok(RemoteResponse::ok(json!({
            "id": format!("{folder_id}/{name}"),
            "name": name,
            "mimeType": file.content_type,
            "size": file.content.len(),
        })))
    }
}

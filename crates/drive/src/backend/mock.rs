//! In-memory document store for testing.

use crate::error::{ErrorKind, Result};
use crate::{Anchor, DriveClient, FileData, FolderPath, RemoteResponse, Segment};
use async_trait::async_trait;
use exn::OptionExt;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// A file the mock accepted, in upload order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub folder_id: String,
    pub file: FileData,
}

#[derive(Debug, Clone)]
struct Folder {
    name: String,
    parent: Option<String>,
}

#[derive(Default)]
struct State {
    next_id: usize,
    folders: HashMap<String, Folder>,
    uploads: Vec<Upload>,
}
impl State {
    fn child(&self, parent: Option<&str>, name: &str) -> Option<String> {
        self.folders
            .iter()
            .find(|(_, folder)| folder.name == name && folder.parent.as_deref() == parent)
            .map(|(id, _)| id.clone())
    }

    fn insert(&mut self, parent: Option<&str>, name: &str) -> String {
        self.next_id += 1;
        let id = format!("folder-{}", self.next_id);
        self.folders.insert(
            id.clone(),
            Folder {
                name: name.to_string(),
                parent: parent.map(str::to_string),
            },
        );
        id
    }

    /// Child lookup, optionally creating the folder when missing.
    fn resolve(&mut self, parent: Option<&str>, name: &str, create: bool) -> Option<String> {
        match self.child(parent, name) {
            Some(id) => Some(id),
            None if create => Some(self.insert(parent, name)),
            None => None,
        }
    }

    fn remove_tree(&mut self, id: &str) {
        let children: Vec<String> = self
            .folders
            .iter()
            .filter(|(_, folder)| folder.parent.as_deref() == Some(id))
            .map(|(child, _)| child.clone())
            .collect();
        for child in children {
            self.remove_tree(&child);
        }
        self.folders.remove(id);
        self.uploads.retain(|upload| upload.folder_id != id);
    }
}

/// Decrements the in-flight counter when an upload finishes or is dropped
/// mid-flight (e.g. by a caller's timeout).
struct InFlight<'a>(&'a AtomicUsize);
impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory document store for testing.
///
/// Folders live in a map behind a [`Mutex`]; ids are handed out as
/// `folder-1`, `folder-2`, ... Latency and failures can be injected per file
/// name, and the mock records call counts and the highest number of
/// concurrent uploads it observed.
#[derive(Default)]
pub struct MockDrive {
    name: String,
    state: Mutex<State>,
    upload_delay: Duration,
    file_delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    vanishing_deletes: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delete_calls: AtomicUsize,
    upload_calls: AtomicUsize,
}
impl MockDrive {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Pre-create a top-level folder with a fixed id, usable as an
    /// [`Anchor::Id`].
    pub fn with_folder(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.state.get_mut().folders.insert(
            id.into(),
            Folder {
                name: name.into(),
                parent: None,
            },
        );
        self
    }

    /// Latency applied to every upload.
    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    /// Latency applied to uploads of one file name, overriding the default.
    pub fn with_file_delay(mut self, file_name: impl Into<String>, delay: Duration) -> Self {
        self.file_delays.insert(file_name.into(), delay);
        self
    }

    /// Uploads of these file names are rejected with a server error.
    pub fn failing_uploads(mut self, file_names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.failing.extend(file_names.into_iter().map(Into::into));
        self
    }

    /// Deletes report the folder as gone even though lookups still find it,
    /// as when another client removes it between the two calls.
    pub fn with_vanishing_deletes(mut self) -> Self {
        self.vanishing_deletes = true;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub async fn uploads(&self) -> Vec<Upload> {
        self.state.lock().await.uploads.clone()
    }

    /// Resolve the folder's id, creating missing segments when asked.
    async fn walk(&self, folder: &FolderPath, create: bool) -> Result<Option<String>> {
        let mut state = self.state.lock().await;
        let mut current: Option<String> = None;
        for segment in folder.segments() {
            let next = match segment {
                Segment::Anchor(Anchor::Id(id)) => {
                    if !state.folders.contains_key(id) {
                        if create {
                            exn::bail!(ErrorKind::NotFound(id.clone()));
                        }
                        return Ok(None);
                    }
                    Some(id.clone())
                },
                Segment::Anchor(Anchor::Name(name)) => state.resolve(None, name, create),
                Segment::Name(name) => state.resolve(current.as_deref(), name, create),
            };
            let Some(next) = next else {
                return Ok(None);
            };
            current = Some(next);
        }
        Ok(current)
    }
}

#[async_trait]
impl DriveClient for MockDrive {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_folder(&self, folder: &FolderPath) -> Result<String> {
        self.walk(folder, true).await?.ok_or_raise(|| ErrorKind::NotFound(folder.to_string()))
    }

    async fn folder_id(&self, folder: &FolderPath) -> Result<Option<String>> {
        self.walk(folder, false).await
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<RemoteResponse> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if self.vanishing_deletes || !state.folders.contains_key(folder_id) {
            exn::bail!(ErrorKind::NotFound(folder_id.to_string()));
        }
        state.remove_tree(folder_id);
        Ok(RemoteResponse::no_content())
    }

    async fn upload_file(&self, file: FileData, folder_id: &str) -> Result<RemoteResponse> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.file_delays.get(&file.file_name).copied().unwrap_or(self.upload_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&file.file_name) {
            exn::bail!(ErrorKind::Rejected {
                status: 500,
                message: format!("upload of {} failed", file.file_name),
            });
        }

        let mut state = self.state.lock().await;
        if !state.folders.contains_key(folder_id) {
            exn::bail!(ErrorKind::NotFound(folder_id.to_string()));
        }
        let response = RemoteResponse::ok(json!({
            "id": format!("{folder_id}/{}", file.file_name),
            "name": file.file_name,
            "mimeType": file.content_type,
        }));
        state.uploads.push(Upload {
            folder_id: folder_id.to_string(),
            file,
        });
        Ok(response)
    }
}

//! Local filesystem key-value stores.
//!
//! Each store is a directory under a shared root; each record is a file
//! named `<key>.<ext>`. The extension decides how the value is read back:
//! `.json` is structured, `.txt` is text, anything else is raw bytes.

use super::{KeyStream, KeyValueStore, OpenOptions, StoreHandle, StoreOpener, StoredValue};
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Directory of local key-value stores.
///
/// # Examples
///
/// ```no_run
/// use kvdrive_storage::{LocalStores, OpenOptions, StoreOpener};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = LocalStores::new("/srv/kvdrive/stores")?;
/// let store = stores.open("reports", OpenOptions::default()).await?;
/// let keys = store.keys().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalStores {
    root: PathBuf,
}
impl LocalStores {
    /// Stores rooted at an absolute directory, which must already exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || !root.is_dir() {
            exn::bail!(ErrorKind::StoreNotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }
}

#[async_trait]
impl StoreOpener for LocalStores {
    async fn open(&self, id_or_name: &str, options: OpenOptions) -> Result<StoreHandle> {
        if options.force_cloud {
            tracing::warn!(store = id_or_name, "Cloud copies are unavailable for local stores, using local copy");
        }
        if id_or_name.is_empty() || id_or_name == "." || id_or_name == ".." || id_or_name.contains(['/', '\\', '\0'])
        {
            exn::bail!(ErrorKind::StoreNotFound(id_or_name.to_string()));
        }
        let directory = self.root.join(id_or_name);
        let is_dir = fs::metadata(&directory).await.map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            exn::bail!(ErrorKind::StoreNotFound(id_or_name.to_string()));
        }
        tracing::debug!(store = id_or_name, path = %directory.display(), "Opened local store");
        Ok(Arc::new(LocalStore {
            name: id_or_name.to_string(),
            directory,
        }))
    }
}

/// A single local key-value store.
pub struct LocalStore {
    name: String,
    directory: PathBuf,
}
impl LocalStore {
    /// Key for a directory entry: the file name without its final extension.
    fn key_of(path: &Path) -> Option<String> {
        path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string)
    }

    /// Find the record file for a key, whatever its extension.
    async fn find(&self, key: &str) -> Result<Option<PathBuf>> {
        let mut entries = fs::read_dir(&self.directory).await.map_err(ErrorKind::Io)?;
        while let Some(entry) = entries.next_entry().await.map_err(ErrorKind::Io)? {
            let path = entry.path();
            if Self::key_of(&path).as_deref() == Some(key) && entry.file_type().await.map_err(ErrorKind::Io)?.is_file() {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    async fn read(key: &str, path: &Path) -> Result<StoredValue> {
        let bytes = fs::read(path).await.map_err(ErrorKind::Io)?;
        let value = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => StoredValue::Json(serde_json::from_slice(&bytes).or_raise(|| ErrorKind::InvalidValue {
                key: key.to_string(),
                reason: "not valid JSON".to_string(),
            })?),
            Some("txt") => StoredValue::Text(String::from_utf8(bytes).or_raise(|| ErrorKind::InvalidValue {
                key: key.to_string(),
                reason: "not valid UTF-8".to_string(),
            })?),
            _ => StoredValue::Bytes(bytes),
        };
        Ok(value)
    }
}

#[async_trait]
impl KeyValueStore for LocalStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn keys_stream(&self) -> KeyStream<'_> {
        Box::pin(stream! {
            let mut entries = match fs::read_dir(&self.directory).await {
                Ok(entries) => entries,
                Err(e) => {
                    yield Err(ErrorKind::Io(e).into());
                    return;
                },
            };
            loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => {
                        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
                        if !is_file {
                            continue;
                        }
                        match Self::key_of(&entry.path()) {
                            Some(key) => yield Ok(key),
                            None => tracing::warn!(store = %self.name, path = %entry.path().display(), "Skipping non UTF-8 file name"),
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(ErrorKind::Io(e).into());
                        break;
                    },
                }
            }
        })
    }

    async fn get_value(&self, key: &str) -> Result<Option<StoredValue>> {
        if key.is_empty() || key.contains(['/', '\\', '\0']) {
            exn::bail!(ErrorKind::InvalidKey(key.to_string()));
        }
        match self.find(key).await? {
            Some(path) => Ok(Some(Self::read(key, &path).await?)),
            None => Ok(None),
        }
    }
}

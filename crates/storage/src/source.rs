//! File sources: where an upload operation's files come from.
//!
//! A [`FileSource`] turns the keys listed in an upload operation into
//! uploadable [`FileData`]. One kind exists today, backed by a key-value
//! store; [`SourceKind`] is the tag that selects it.

use crate::error::{ErrorKind, Result};
use crate::file::FileRef;
use crate::store::{OpenOptions, OpenerHandle, StoreHandle};
use async_trait::async_trait;
use exn::OptionExt;
use futures::TryStreamExt;
use kvdrive_drive::FileData;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub type SourceHandle = Arc<dyn FileSource + Send + Sync>;

/// Closed set of source kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceKind {
    #[default]
    KeyValueStore,
}
impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyValueStore => "key-value-store",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "key-value-store" => Some(Self::KeyValueStore),
            _ => None,
        }
    }
}
impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider of the files for one upload operation.
#[async_trait]
pub trait FileSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// The configured file list, in declaration order.
    fn files(&self) -> &[FileRef];

    /// Establish the backing handle and verify that every configured file
    /// exists. Repeated calls after a success do nothing.
    async fn initialize(&self) -> Result<()>;

    /// Name a configured key is uploaded under.
    fn file_name(&self, key: &str) -> Result<&str> {
        self.files()
            .iter()
            .find(|file| file.key == key)
            .map(FileRef::display_name)
            .ok_or_raise(|| ErrorKind::FileNotFound(key.to_string()))
    }

    /// Fetch a file ready for upload.
    async fn file_data(&self, key: &str) -> Result<FileData>;
}

/// Files held in a key-value store.
///
/// # Examples
///
/// ```no_run
/// use kvdrive_storage::{FileRef, FileSource, KeyValueStoreSource, LocalStores, OpenOptions};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = LocalStores::new("/srv/kvdrive/stores")?;
/// let source = KeyValueStoreSource::new(
///     Arc::new(stores),
///     "reports",
///     OpenOptions::default(),
///     vec![FileRef::new("q1").with_name("q1.txt")],
/// );
/// source.initialize().await?;
/// let data = source.file_data("q1").await?;
/// assert_eq!(data.file_name, "q1.txt");
/// # Ok(())
/// # }
/// ```
pub struct KeyValueStoreSource {
    opener: OpenerHandle,
    id_or_name: String,
    options: OpenOptions,
    files: Vec<FileRef>,
    store: OnceCell<StoreHandle>,
}
impl KeyValueStoreSource {
    /// A source over `files`, keeping only the first entry for each key.
    pub fn new(opener: OpenerHandle, id_or_name: impl Into<String>, options: OpenOptions, files: Vec<FileRef>) -> Self {
        let mut seen = HashSet::new();
        let files = files.into_iter().filter(|file| seen.insert(file.key.clone())).collect();
        Self {
            opener,
            id_or_name: id_or_name.into(),
            options,
            files,
            store: OnceCell::new(),
        }
    }

    async fn store(&self) -> Result<&StoreHandle> {
        self.store.get_or_try_init(|| self.open_and_verify()).await
    }

    async fn open_and_verify(&self) -> Result<StoreHandle> {
        let store = self.opener.open(&self.id_or_name, self.options).await?;
        let present: HashSet<String> = store.keys_stream().try_collect().await?;
        // Keys are unique, so this is every missing key in declaration order.
        let missing: Vec<String> =
            self.files.iter().map(|file| &file.key).filter(|key| !present.contains(*key)).cloned().collect();
        if !missing.is_empty() {
            tracing::error!(store = %self.id_or_name, missing = ?missing, "Requested files are missing from the store");
            exn::bail!(ErrorKind::FilesNotFound(missing));
        }
        tracing::debug!(store = %self.id_or_name, files = self.files.len(), "Key-value store source ready");
        Ok(store)
    }
}

#[async_trait]
impl FileSource for KeyValueStoreSource {
    fn kind(&self) -> SourceKind {
        SourceKind::KeyValueStore
    }

    fn files(&self) -> &[FileRef] {
        &self.files
    }

    async fn initialize(&self) -> Result<()> {
        self.store().await.map(|_| ())
    }

    async fn file_data(&self, key: &str) -> Result<FileData> {
        let file_name = self.file_name(key)?.to_string();
        let store = self.store().await?;
        let value = store
            .get_value(key)
            .await?
            .filter(|value| !value.is_empty())
            .ok_or_raise(|| ErrorKind::EmptyContent(key.to_string()))?;
        let content_type = value.content_type();
        Ok(FileData::new(file_name, content_type, value.into_bytes()))
    }
}

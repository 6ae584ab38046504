//! Key-value store traits and implementations.
//!
//! A [`StoreOpener`] hands out [`KeyValueStore`] handles by id or name; a
//! store enumerates its keys and returns values in one of three shapes
//! (raw bytes, text, or structured JSON).

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::{LocalStore, LocalStores};
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockStore, MockStores};
use crate::error::Result;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;

pub type KeyStream<'a> = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;
pub type StoreHandle = Arc<dyn KeyValueStore + Send + Sync>;
pub type OpenerHandle = Arc<dyn StoreOpener + Send + Sync>;

const OCTET_STREAM: &str = "application/octet-stream";

/// A value as the store returned it.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Bytes(Vec<u8>),
    Text(String),
    Json(Value),
}
impl StoredValue {
    /// Empty content is treated the same as missing content.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Text(text) => text.is_empty(),
            Self::Json(value) => value.is_null(),
        }
    }

    /// Content type for upload. Bytes are sniffed from their magic numbers.
    ///
    /// ```
    /// use kvdrive_storage::StoredValue;
    ///
    /// let png = StoredValue::Bytes(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    /// assert_eq!(png.content_type(), "image/png");
    /// assert_eq!(StoredValue::Text("hi".to_string()).content_type(), "text/plain");
    /// ```
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Bytes(bytes) => infer::get(bytes).map_or(OCTET_STREAM, |kind| kind.mime_type()),
            Self::Text(_) => "text/plain",
            Self::Json(_) => "application/json",
        }
    }

    /// UTF-8 bytes for textual values, raw bytes otherwise.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.into_bytes(),
            Self::Json(value) => value.to_string().into_bytes(),
        }
    }
}

/// Options forwarded when opening a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Open the cloud copy of the store even when a local one exists.
    pub force_cloud: bool,
}

/// A single opened key-value store.
///
/// Handles are shared read-only across concurrent fetches, so
/// implementations must tolerate independent concurrent calls.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Name of the store (used for logging only).
    fn name(&self) -> &str;

    /// Stream every key in the store.
    fn keys_stream(&self) -> KeyStream<'_>;

    /// Collect every key in the store.
    async fn keys(&self) -> Result<Vec<String>> {
        self.keys_stream().try_collect().await
    }

    /// Fetch a value; `None` when the key does not exist.
    async fn get_value(&self, key: &str) -> Result<Option<StoredValue>>;
}

/// Opens key-value stores by id or name.
#[async_trait]
pub trait StoreOpener: Send + Sync {
    async fn open(&self, id_or_name: &str, options: OpenOptions) -> Result<StoreHandle>;
}

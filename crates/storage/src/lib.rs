//! Backing key-value stores and the file sources built on top of them.
//!
//! Upload operations read their files through a [`FileSource`]; the only
//! kind today reads from a [`KeyValueStore`] opened by a [`StoreOpener`].

pub mod error;
mod file;
mod source;
mod store;

pub use crate::file::{FileOptions, FileRef, ResourceOptions};
pub use crate::source::{FileSource, KeyValueStoreSource, SourceHandle, SourceKind};
#[cfg(any(test, feature = "mock"))]
pub use crate::store::{MockStore, MockStores};
pub use crate::store::{
    KeyStream, KeyValueStore, LocalStore, LocalStores, OpenOptions, OpenerHandle, StoreHandle, StoreOpener,
    StoredValue,
};

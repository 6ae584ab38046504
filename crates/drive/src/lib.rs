//! Remote document-storage model and client interface.
//!
//! A [`FolderPath`] is the canonical identity of a folder on the remote
//! service: a parent anchor (an existing folder id, or a top-level folder
//! name) plus an optional relative path beneath it. The [`DriveClient`]
//! trait is the narrow interface the pipeline talks to; authentication and
//! transport live behind it.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::DriveClient;
pub use crate::models::{FileData, RemoteResponse};
pub use crate::path::{Anchor, FolderPath, Segment};
use std::sync::Arc;

pub type DriveHandle = Arc<dyn DriveClient + Send + Sync>;

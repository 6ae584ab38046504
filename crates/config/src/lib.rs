//! Job configuration: loading, validation and folder resolution.
//!
//! The raw JSON object is loaded by [`loader::load`] and validated by
//! [`Config::parse`] into run-wide [`Settings`] and an immutable
//! [`ExecutionPlan`]. Folder specifications are resolved to
//! [`FolderPath`](kvdrive_drive::FolderPath)s during validation, so the plan
//! never carries unresolved references.

mod constants;
pub mod error;
pub mod folder;
pub mod loader;
mod operation;
mod settings;
mod validate;

pub use crate::constants::{Constant, ConstantValue, Constants};
pub use crate::operation::{
    DeleteFolderOperation, ExecutionPlan, Operation, OperationType, UploadOperation, UploadSource,
};
pub use crate::settings::{DEFAULT_FILE_UPLOAD_TIMEOUT, DEFAULT_TOKENS_STORE, OAuthCredentials, Settings};
pub use crate::validate::Config;

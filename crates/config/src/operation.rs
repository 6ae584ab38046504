//! The typed execution plan.

use crate::constants::Constants;
use kvdrive_drive::FolderPath;
use kvdrive_storage::{FileRef, SourceKind};
use serde::{Serialize, Serializer};
use std::fmt;

/// Closed set of operation types, named as they appear in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperationType {
    #[serde(rename = "upload-files-to-folder")]
    Upload,
    #[serde(rename = "folders-delete")]
    DeleteFolder,
}
impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload-files-to-folder",
            Self::DeleteFolder => "folders-delete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "upload-files-to-folder" => Some(Self::Upload),
            "folders-delete" => Some(Self::DeleteFolder),
            _ => None,
        }
    }
}
impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSource {
    #[serde(rename = "type", serialize_with = "display")]
    pub kind: SourceKind,
    pub id_or_name: String,
    pub force_cloud: bool,
    pub files: Vec<FileRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOperation {
    pub source: UploadSource,
    #[serde(serialize_with = "display")]
    pub destination: FolderPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFolderOperation {
    #[serde(serialize_with = "display")]
    pub folder: FolderPath,
}

/// A resolved operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Operation {
    #[serde(rename = "upload-files-to-folder")]
    Upload(UploadOperation),
    #[serde(rename = "folders-delete")]
    DeleteFolder(DeleteFolderOperation),
}
impl Operation {
    pub fn kind(&self) -> OperationType {
        match self {
            Self::Upload(_) => OperationType::Upload,
            Self::DeleteFolder(_) => OperationType::DeleteFolder,
        }
    }
}
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload(upload) => write!(
                f,
                "{} {} file(s) from {} to {}",
                self.kind(),
                upload.source.files.len(),
                upload.source.id_or_name,
                upload.destination
            ),
            Self::DeleteFolder(delete) => write!(f, "{} {}", self.kind(), delete.folder),
        }
    }
}

/// Ordered operations plus the constants they were resolved against.
/// Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionPlan {
    pub constants: Constants,
    pub operations: Vec<Operation>,
}
impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

fn display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

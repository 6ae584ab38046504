//! Per-item result records: the externally observed output of a run.

use kvdrive_config::OperationType;
use kvdrive_drive::RemoteResponse;
use kvdrive_storage::FileRef;
use serde::Serialize;

pub const FOLDER_MISSING_NOTE: &str = "folder does not exist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Detail {
    /// The remote service's answer, verbatim.
    Response(RemoteResponse),
    Note { note: String },
    Errors { errors: Vec<String> },
}

/// One record per uploaded file, or per deleted folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub operation: OperationType,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileRef>,
    pub folder_id_or_name: String,
    pub detail: Detail,
}
impl Record {
    pub fn uploaded(file: FileRef, folder_id: impl Into<String>, response: RemoteResponse) -> Self {
        Self {
            operation: OperationType::Upload,
            status: Status::Success,
            file: Some(file),
            folder_id_or_name: folder_id.into(),
            detail: Detail::Response(response),
        }
    }

    pub fn upload_failed(file: FileRef, folder_id: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            operation: OperationType::Upload,
            status: Status::Failed,
            file: Some(file),
            folder_id_or_name: folder_id.into(),
            detail: Detail::Errors { errors },
        }
    }

    pub fn deleted(folder_id: impl Into<String>, response: RemoteResponse) -> Self {
        Self {
            operation: OperationType::DeleteFolder,
            status: Status::Success,
            file: None,
            folder_id_or_name: folder_id.into(),
            detail: Detail::Response(response),
        }
    }

    /// Deleting an absent folder is a success.
    pub fn folder_missing(folder: impl Into<String>) -> Self {
        Self {
            operation: OperationType::DeleteFolder,
            status: Status::Success,
            file: None,
            folder_id_or_name: folder.into(),
            detail: Detail::Note {
                note: FOLDER_MISSING_NOTE.to_string(),
            },
        }
    }

    pub fn delete_failed(folder: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            operation: OperationType::DeleteFolder,
            status: Status::Failed,
            file: None,
            folder_id_or_name: folder.into(),
            detail: Detail::Errors { errors },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_record_shape() {
        let record = Record::uploaded(
            FileRef::new("q1").with_name("q1.pdf"),
            "folder-1",
            RemoteResponse::ok(json!({ "id": "f" })),
        );
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "operation": "upload-files-to-folder",
                "status": "success",
                "file": { "key": "q1", "name": "q1.pdf" },
                "folderIdOrName": "folder-1",
                "detail": { "status": 200, "statusText": "OK", "data": { "id": "f" } },
            })
        );
    }

    #[test]
    fn test_missing_folder_record_shape() {
        let record = Record::folder_missing("{team}/old");
        assert!(record.is_success());
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "operation": "folders-delete",
                "status": "success",
                "folderIdOrName": "{team}/old",
                "detail": { "note": "folder does not exist" },
            })
        );
    }

    #[test]
    fn test_failed_record_carries_errors() {
        let record = Record::delete_failed("folder-1", vec!["boom".to_string()]);
        assert!(!record.is_success());
        assert_eq!(serde_json::to_value(&record).unwrap()["detail"], json!({ "errors": ["boom"] }));
    }
}

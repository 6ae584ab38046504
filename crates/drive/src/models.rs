//! Payloads exchanged with the remote service.

use serde::Serialize;
use serde_json::Value;

/// A file ready to be uploaded: display name, sniffed content type and the
/// raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}
impl FileData {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// The remote service's answer to a mutating request, reported verbatim in
/// result records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResponse {
    pub status: u16,
    pub status_text: String,
    pub data: Value,
}
impl RemoteResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            data,
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            status_text: "No Content".to_string(),
            data: Value::Null,
        }
    }
}

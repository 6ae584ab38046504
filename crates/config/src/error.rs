//! Config Error Types
//!
//! Every variant names the offending field by its path in the configuration
//! object (e.g. `operations[1].source.files`), so the message alone is
//! enough to fix the job description.

use derive_more::{Display, Error};
use serde_json::Value;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading and validation.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration root must be an object, found {_0}")]
    RootNotObject(#[error(not(source))] String),
    #[display("missing required field `{_0}`")]
    MissingField(#[error(not(source))] String),
    #[display("field `{field}` must be {expected}, found {found}")]
    InvalidField {
        field: String,
        expected: &'static str,
        found: String,
    },
    #[display("unknown operation type {value} at `{field}`")]
    UnknownOperationType { field: String, value: String },
    #[display("unknown source type {value} at `{field}`")]
    UnknownSourceType { field: String, value: String },
    #[display("duplicate constant `{_0}`")]
    DuplicateConstant(#[error(not(source))] String),
    #[display("invalid folder at `{_0}`")]
    InvalidFolder(#[error(not(source))] String),
    #[display("could not load configuration: {_0}")]
    Load(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Configuration is either valid or it isn't.
        false
    }

    pub(crate) fn invalid(field: impl Into<String>, expected: &'static str, found: &Value) -> Self {
        Self::InvalidField {
            field: field.into(),
            expected,
            found: type_name(found).to_string(),
        }
    }
}

/// JSON type of a value, for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(s) if s.is_empty() => "an empty string",
        Value::String(_) => "a string",
        Value::Array(a) if a.is_empty() => "an empty array",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! FolderSpec resolution.
//!
//! Turns a user-facing folder reference (a path string, a `{ path,
//! parentFolderId }` object, or a `constants.<name>` placeholder for either)
//! into a canonical [`FolderPath`].

use crate::constants::Constants;
use derive_more::{Display, Error};
use exn::{OptionExt, ResultExt};
use kvdrive_drive::FolderPath;
use serde_json::Value;

/// A folder specification error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Prefix that marks a whole-field constant reference.
pub const CONSTANT_PREFIX: &str = "constants.";

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("folder must be a string or an object, found {_0}")]
    InvalidType(#[error(not(source))] String),
    #[display("constant \"{_0}\" not found")]
    ConstantNotFound(#[error(not(source))] String),
    #[display("folder object must have a string \"path\"")]
    InvalidPathField,
    #[display("\"parentFolderId\" must be a non-empty string")]
    InvalidParentFolderId,
    #[display("invalid folder path \"{_0}\"")]
    InvalidPath(#[error(not(source))] String),
}

/// Resolve a folder specification against the constants table.
///
/// Only a string that is, in its entirety, `constants.<name>` is substituted;
/// the constant's value is not itself resolved again.
///
/// # Examples
///
/// ```
/// use kvdrive_config::{Constant, ConstantValue, Constants, folder};
/// use serde_json::json;
///
/// let constants: Constants = [Constant::new("dest", ConstantValue::Path("shared/archive".to_string()))]
///     .into_iter()
///     .collect();
/// let path = folder::resolve(&json!("constants.dest"), &constants).unwrap();
/// assert_eq!(path.parent_folder_name(), Some("shared"));
/// assert_eq!(path.relative_path(), Some("archive"));
///
/// let path = folder::resolve(&json!({ "parentFolderId": "X", "path": "a/b" }), &constants).unwrap();
/// assert_eq!(path.parent_folder_id(), Some("X"));
/// assert_eq!(path.relative_path(), Some("a/b"));
/// ```
pub fn resolve(spec: &Value, constants: &Constants) -> Result<FolderPath> {
    let substituted;
    let spec = match spec {
        Value::String(s) => match s.strip_prefix(CONSTANT_PREFIX) {
            Some(name) => {
                let value = constants.get(name).ok_or_raise(|| ErrorKind::ConstantNotFound(name.to_string()))?;
                tracing::trace!(constant = name, "Substituted folder constant");
                substituted = value.to_value();
                &substituted
            },
            None => spec,
        },
        Value::Object(_) => spec,
        other => exn::bail!(ErrorKind::InvalidType(crate::error::type_name(other).to_string())),
    };

    let (path, parent_folder_id) = match spec {
        Value::String(path) => (path.as_str(), None),
        Value::Object(object) => {
            let path = object.get("path").and_then(Value::as_str).ok_or_raise(|| ErrorKind::InvalidPathField)?;
            let parent_folder_id = match object.get("parentFolderId") {
                None | Some(Value::Null) => None,
                Some(Value::String(id)) if !id.is_empty() => Some(id.as_str()),
                Some(_) => exn::bail!(ErrorKind::InvalidParentFolderId),
            };
            (path, parent_folder_id)
        },
        other => exn::bail!(ErrorKind::InvalidType(crate::error::type_name(other).to_string())),
    };

    let folder = match parent_folder_id {
        Some(id) => FolderPath::with_parent_id(id, Some(path.to_string())),
        None => {
            let (name, relative) = match path.split_once('/') {
                Some((name, relative)) => (name, Some(relative.to_string())),
                None => (path, None),
            };
            FolderPath::with_parent_name(name, relative)
        },
    };
    folder.or_raise(|| ErrorKind::InvalidPath(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{Constant, ConstantValue};
    use kvdrive_drive::Anchor;
    use rstest::rstest;
    use serde_json::json;

    fn constants() -> Constants {
        [
            Constant::new("dest", ConstantValue::Path("shared/archive".to_string())),
            Constant::new(
                "anchored",
                ConstantValue::Folder(
                    json!({ "parentFolderId": "ROOT", "path": "exports/daily" })
                        .as_object()
                        .cloned()
                        .unwrap(),
                ),
            ),
            Constant::new("chained", ConstantValue::Path("constants.dest".to_string())),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    #[case(json!("team/reports/q1"), Anchor::Name("team".to_string()), Some("reports/q1"))]
    #[case(json!("team"), Anchor::Name("team".to_string()), None)]
    #[case(json!("team/"), Anchor::Name("team".to_string()), None)]
    #[case(json!("team/reports/"), Anchor::Name("team".to_string()), Some("reports"))]
    #[case(json!({ "parentFolderId": "X", "path": "a/b/" }), Anchor::Id("X".to_string()), Some("a/b"))]
    #[case(json!({ "path": "team/q1" }), Anchor::Name("team".to_string()), Some("q1"))]
    #[case(json!({ "parentFolderId": "X", "path": "a/b" }), Anchor::Id("X".to_string()), Some("a/b"))]
    #[case(json!({ "parentFolderId": "X", "path": "" }), Anchor::Id("X".to_string()), None)]
    #[case(json!({ "parentFolderId": null, "path": "a/b" }), Anchor::Name("a".to_string()), Some("b"))]
    #[case(json!("constants.dest"), Anchor::Name("shared".to_string()), Some("archive"))]
    #[case(json!("constants.anchored"), Anchor::Id("ROOT".to_string()), Some("exports/daily"))]
    // Whole-field match only: an embedded token is a literal path segment.
    #[case(json!("archive/constants.dest"), Anchor::Name("archive".to_string()), Some("constants.dest"))]
    fn test_resolve(#[case] spec: Value, #[case] anchor: Anchor, #[case] relative: Option<&str>) {
        let folder = resolve(&spec, &constants()).unwrap();
        assert_eq!(folder.anchor(), &anchor);
        assert_eq!(folder.relative_path(), relative);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let constants = constants();
        let first = resolve(&json!("constants.dest"), &constants).unwrap();
        let second = resolve(&json!("constants.dest"), &constants).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_constants_are_not_resolved_recursively() {
        let folder = resolve(&json!("constants.chained"), &constants()).unwrap();
        assert_eq!(folder.parent_folder_name(), Some("constants.dest"));
    }

    #[rstest]
    #[case(json!("constants.missing"))]
    #[case(json!("constants."))]
    fn test_constant_not_found(#[case] spec: Value) {
        let err = resolve(&spec, &constants()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::ConstantNotFound(_)));
    }

    #[rstest]
    #[case(json!(42))]
    #[case(json!(null))]
    #[case(json!(["a"]))]
    #[case(json!(true))]
    fn test_invalid_type(#[case] spec: Value) {
        let err = resolve(&spec, &Constants::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidType(_)));
    }

    #[rstest]
    #[case(json!({ "parentFolderId": "X" }))]
    #[case(json!({ "path": 7 }))]
    fn test_invalid_path_field(#[case] spec: Value) {
        let err = resolve(&spec, &Constants::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPathField));
    }

    #[rstest]
    #[case(json!({ "parentFolderId": "", "path": "a" }))]
    #[case(json!({ "parentFolderId": 12, "path": "a" }))]
    fn test_invalid_parent_folder_id(#[case] spec: Value) {
        let err = resolve(&spec, &Constants::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidParentFolderId));
    }

    #[rstest]
    #[case(json!(""))]
    #[case(json!("/team"))]
    #[case(json!("team//q1"))]
    #[case(json!("team/reports//"))]
    #[case(json!("../team"))]
    #[case(json!({ "parentFolderId": "X", "path": "a/../b" }))]
    fn test_invalid_path(#[case] spec: Value) {
        let err = resolve(&spec, &Constants::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}

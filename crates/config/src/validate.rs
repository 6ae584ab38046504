//! Validation of the raw configuration object.
//!
//! [`Config::parse`] is a pure function: it either returns the complete
//! settings and plan, or the first violation found, naming the field.

use crate::constants::{Constant, ConstantValue, Constants};
use crate::error::{ErrorKind, Result, type_name};
use crate::folder;
use crate::operation::{DeleteFolderOperation, ExecutionPlan, Operation, OperationType, UploadOperation, UploadSource};
use crate::settings::{DEFAULT_FILE_UPLOAD_TIMEOUT, DEFAULT_TOKENS_STORE, OAuthCredentials, Settings};
use exn::{OptionExt, ResultExt};
use kvdrive_drive::FolderPath;
use kvdrive_storage::{FileOptions, FileRef, ResourceOptions, SourceKind};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::time::Duration;

type Object = Map<String, Value>;

/// Validated configuration: global settings plus the execution plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub settings: Settings,
    pub plan: ExecutionPlan,
}

impl Config {
    /// Validate a raw configuration object.
    ///
    /// # Examples
    ///
    /// ```
    /// use kvdrive_config::Config;
    /// use serde_json::json;
    ///
    /// let config = Config::parse(&json!({
    ///     "operations": [{ "type": "folders-delete", "folder": "team/old" }],
    /// }))
    /// .unwrap();
    /// assert_eq!(config.plan.operations.len(), 1);
    /// assert_eq!(config.settings.file_upload_timeout.as_secs(), 120);
    ///
    /// let setup = Config::parse(&json!({ "isSetupMode": true })).unwrap();
    /// assert!(setup.plan.is_empty());
    /// ```
    pub fn parse(raw: &Value) -> Result<Self> {
        let Value::Object(root) = raw else {
            exn::bail!(ErrorKind::RootNotObject(type_name(raw).to_string()));
        };
        let settings = parse_settings(root)?;
        if settings.is_setup_mode {
            tracing::debug!("Setup mode, skipping constants and operations");
            return Ok(Self {
                settings,
                plan: ExecutionPlan::default(),
            });
        }

        let constants = parse_constants(root.get("constants"))?;
        let operations = match root.get("operations") {
            None | Some(Value::Null) => exn::bail!(ErrorKind::MissingField("operations".to_string())),
            Some(Value::Array(entries)) if !entries.is_empty() => entries
                .iter()
                .enumerate()
                .map(|(index, entry)| parse_operation(&format!("operations[{index}]"), entry, &constants))
                .collect::<Result<Vec<_>>>()?,
            Some(other) => exn::bail!(ErrorKind::invalid("operations", "a non-empty array", other)),
        };
        tracing::debug!(constants = constants.len(), operations = operations.len(), "Configuration validated");
        Ok(Self {
            settings,
            plan: ExecutionPlan { constants, operations },
        })
    }
}

fn parse_settings(root: &Object) -> Result<Settings> {
    let is_setup_mode = match root.get("isSetupMode") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => exn::bail!(ErrorKind::invalid("isSetupMode", "a boolean", other)),
    };

    let file_upload_timeout = match number(root, "fileUploadTimeoutSecs")? {
        Some(secs) if secs > 0.0 => {
            Duration::try_from_secs_f64(secs).or_raise(|| ErrorKind::InvalidField {
                field: "fileUploadTimeoutSecs".to_string(),
                expected: "a representable duration",
                found: secs.to_string(),
            })?
        },
        _ => DEFAULT_FILE_UPLOAD_TIMEOUT,
    };

    let file_uploading_max_concurrency = match number(root, "fileUploadingMaxConcurrency")? {
        Some(n) if n.fract() != 0.0 => exn::bail!(ErrorKind::InvalidField {
            field: "fileUploadingMaxConcurrency".to_string(),
            expected: "a whole number",
            found: n.to_string(),
        }),
        Some(n) => NonZeroUsize::new(n as usize),
        None => None,
    };

    let tokens_store = match aliased(root, "tokensStore", "googleOAuthTokensStore") {
        None => DEFAULT_TOKENS_STORE.to_string(),
        Some((_, Value::String(store))) if !store.is_empty() => store.clone(),
        Some((field, other)) => exn::bail!(ErrorKind::invalid(field, "a non-empty string", other)),
    };

    let oauth_credentials = match aliased(root, "oauthCredentials", "googleOAuthCredentials") {
        None => None,
        Some((field, Value::Object(credentials))) => Some(OAuthCredentials {
            client_id: required_string(credentials, field, "client_id")?,
            client_secret: required_string(credentials, field, "client_secret")?,
            redirect_uri: required_string(credentials, field, "redirect_uri")?,
        }),
        Some((field, other)) => exn::bail!(ErrorKind::invalid(field, "an object", other)),
    };

    Ok(Settings {
        is_setup_mode,
        file_upload_timeout,
        file_uploading_max_concurrency,
        tokens_store,
        oauth_credentials,
    })
}

/// A setting under its current name or its legacy alias; null counts as
/// absent and the current name wins.
fn aliased<'a>(root: &'a Object, name: &'static str, alias: &'static str) -> Option<(&'static str, &'a Value)> {
    [name, alias]
        .into_iter()
        .find_map(|field| root.get(field).filter(|value| !value.is_null()).map(|value| (field, value)))
}

/// Non-negative number, accepting numeric strings (environment overrides
/// arrive as strings). Null and absent are both `None`.
fn number(root: &Object, field: &'static str) -> Result<Option<f64>> {
    let parsed = match root.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => exn::bail!(ErrorKind::invalid(field, "a number", other)),
    };
    match parsed {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(Some(n)),
        _ => exn::bail!(ErrorKind::InvalidField {
            field: field.to_string(),
            expected: "a non-negative number",
            found: root.get(field).map(Value::to_string).unwrap_or_default(),
        }),
    }
}

fn required_string(object: &Object, prefix: &str, name: &str) -> Result<String> {
    let field = format!("{prefix}.{name}");
    match object.get(name) {
        None | Some(Value::Null) => exn::bail!(ErrorKind::MissingField(field)),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(other) => exn::bail!(ErrorKind::invalid(field, "a non-empty string", other)),
    }
}

fn optional_string(object: &Object, prefix: &str, name: &str) -> Result<Option<String>> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => exn::bail!(ErrorKind::invalid(format!("{prefix}.{name}"), "a string", other)),
    }
}

fn object<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a Object> {
    match value {
        None | Some(Value::Null) => exn::bail!(ErrorKind::MissingField(field.to_string())),
        Some(Value::Object(object)) => Ok(object),
        Some(other) => exn::bail!(ErrorKind::invalid(field, "an object", other)),
    }
}

fn parse_constants(value: Option<&Value>) -> Result<Constants> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(Constants::default()),
        Some(Value::Array(entries)) => entries,
        Some(other) => exn::bail!(ErrorKind::invalid("constants", "an array", other)),
    };
    let mut constants = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let prefix = format!("constants[{index}]");
        let entry = object(Some(entry), &prefix)?;
        let name = required_string(entry, &prefix, "name")?;
        let value = match entry.get("value") {
            None | Some(Value::Null) => exn::bail!(ErrorKind::MissingField(format!("{prefix}.value"))),
            Some(Value::String(path)) => ConstantValue::Path(path.clone()),
            Some(Value::Object(folder)) => ConstantValue::Folder(folder.clone()),
            Some(other) => exn::bail!(ErrorKind::invalid(format!("{prefix}.value"), "a string or an object", other)),
        };
        if constants.iter().any(|constant: &Constant| constant.name == name) {
            exn::bail!(ErrorKind::DuplicateConstant(name));
        }
        constants.push(Constant::new(name, value));
    }
    Ok(constants.into_iter().collect())
}

fn parse_operation(prefix: &str, entry: &Value, constants: &Constants) -> Result<Operation> {
    let entry = object(Some(entry), prefix)?;
    let type_field = format!("{prefix}.type");
    let kind = match entry.get("type") {
        Some(Value::String(name)) => OperationType::from_name(name),
        _ => None,
    };
    let Some(kind) = kind else {
        exn::bail!(ErrorKind::UnknownOperationType {
            field: type_field,
            value: entry.get("type").map_or_else(|| "(missing)".to_string(), Value::to_string),
        });
    };
    let operation = match kind {
        OperationType::Upload => Operation::Upload(UploadOperation {
            source: parse_source(&format!("{prefix}.source"), entry.get("source"))?,
            destination: parse_folder(&format!("{prefix}.destination"), entry.get("destination"), constants)?,
        }),
        OperationType::DeleteFolder => Operation::DeleteFolder(DeleteFolderOperation {
            folder: parse_folder(&format!("{prefix}.folder"), entry.get("folder"), constants)?,
        }),
    };
    Ok(operation)
}

fn parse_source(prefix: &str, value: Option<&Value>) -> Result<UploadSource> {
    let source = object(value, prefix)?;
    let kind = match source.get("type") {
        None | Some(Value::Null) => SourceKind::default(),
        Some(Value::String(name)) => SourceKind::from_name(name).ok_or_raise(|| ErrorKind::UnknownSourceType {
            field: format!("{prefix}.type"),
            value: format!("\"{name}\""),
        })?,
        Some(other) => exn::bail!(ErrorKind::invalid(format!("{prefix}.type"), "a string", other)),
    };
    let id_or_name = required_string(source, prefix, "idOrName")?;
    let force_cloud = match source.get("forceCloud") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => exn::bail!(ErrorKind::invalid(format!("{prefix}.forceCloud"), "a boolean", other)),
    };
    let files_field = format!("{prefix}.files");
    let files = match source.get("files") {
        None | Some(Value::Null) => exn::bail!(ErrorKind::MissingField(files_field)),
        Some(Value::Array(files)) if !files.is_empty() => files
            .iter()
            .enumerate()
            .map(|(index, file)| parse_file(&format!("{files_field}[{index}]"), file))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => exn::bail!(ErrorKind::invalid(files_field, "a non-empty array", other)),
    };
    // One upload per key; the first entry for a key wins.
    let mut seen = HashSet::new();
    let files = files
        .into_iter()
        .filter(|file| {
            let first = seen.insert(file.key.clone());
            if !first {
                tracing::warn!(field = %files_field, key = %file.key, "Ignoring duplicate file key");
            }
            first
        })
        .collect();
    Ok(UploadSource {
        kind,
        id_or_name,
        force_cloud,
        files,
    })
}

fn parse_file(prefix: &str, value: &Value) -> Result<FileRef> {
    let file = object(Some(value), prefix)?;
    let options = match file.get("options") {
        None | Some(Value::Null) => None,
        Some(Value::Object(options)) => {
            let resource = match options.get("resource") {
                None | Some(Value::Null) => None,
                Some(Value::Object(resource)) => Some(ResourceOptions {
                    name: optional_string(resource, &format!("{prefix}.options.resource"), "name")?,
                }),
                Some(other) => {
                    exn::bail!(ErrorKind::invalid(format!("{prefix}.options.resource"), "an object", other))
                },
            };
            Some(FileOptions { resource })
        },
        Some(other) => exn::bail!(ErrorKind::invalid(format!("{prefix}.options"), "an object", other)),
    };
    Ok(FileRef {
        key: required_string(file, prefix, "key")?,
        name: optional_string(file, prefix, "name")?,
        options,
    })
}

fn parse_folder(field: &str, value: Option<&Value>, constants: &Constants) -> Result<FolderPath> {
    let spec = value.filter(|v| !v.is_null()).ok_or_raise(|| ErrorKind::MissingField(field.to_string()))?;
    folder::resolve(spec, constants).or_raise(|| ErrorKind::InvalidFolder(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvdrive_drive::Anchor;
    use rstest::rstest;
    use serde_json::json;

    fn upload(source: Value, destination: Value) -> Value {
        json!({ "type": "upload-files-to-folder", "source": source, "destination": destination })
    }

    fn parse_err(raw: Value) -> crate::error::Error {
        Config::parse(&raw).unwrap_err()
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse(&json!({
            "operations": [{ "type": "folders-delete", "folder": "team" }],
        }))
        .unwrap();
        assert_eq!(config.settings, Settings::default());
        assert!(config.plan.constants.is_empty());
    }

    #[rstest]
    #[case(json!([]))]
    #[case(json!("config"))]
    #[case(json!(null))]
    fn test_root_not_object(#[case] raw: Value) {
        assert!(matches!(&*parse_err(raw), ErrorKind::RootNotObject(_)));
    }

    #[test]
    fn test_setup_mode_skips_plan() {
        let config = Config::parse(&json!({ "isSetupMode": true, "operations": "ignored" })).unwrap();
        assert!(config.settings.is_setup_mode);
        assert!(config.plan.is_empty());
    }

    #[rstest]
    #[case(json!(30), Duration::from_secs(30))]
    #[case(json!("45"), Duration::from_secs(45))]
    #[case(json!(1.5), Duration::from_millis(1500))]
    #[case(json!(0), DEFAULT_FILE_UPLOAD_TIMEOUT)]
    #[case(json!(null), DEFAULT_FILE_UPLOAD_TIMEOUT)]
    fn test_upload_timeout(#[case] value: Value, #[case] expected: Duration) {
        let config = Config::parse(&json!({ "isSetupMode": true, "fileUploadTimeoutSecs": value })).unwrap();
        assert_eq!(config.settings.file_upload_timeout, expected);
    }

    #[rstest]
    #[case(json!(2), NonZeroUsize::new(2))]
    #[case(json!("8"), NonZeroUsize::new(8))]
    #[case(json!(0), None)]
    fn test_max_concurrency(#[case] value: Value, #[case] expected: Option<NonZeroUsize>) {
        let config = Config::parse(&json!({ "isSetupMode": true, "fileUploadingMaxConcurrency": value })).unwrap();
        assert_eq!(config.settings.file_uploading_max_concurrency, expected);
    }

    #[rstest]
    #[case(json!({ "fileUploadTimeoutSecs": -1 }), "fileUploadTimeoutSecs")]
    #[case(json!({ "fileUploadTimeoutSecs": "soon" }), "fileUploadTimeoutSecs")]
    #[case(json!({ "fileUploadTimeoutSecs": [] }), "fileUploadTimeoutSecs")]
    #[case(json!({ "fileUploadingMaxConcurrency": 2.5 }), "fileUploadingMaxConcurrency")]
    #[case(json!({ "isSetupMode": "yes" }), "isSetupMode")]
    #[case(json!({ "tokensStore": "" }), "tokensStore")]
    #[case(json!({ "oauthCredentials": "secret" }), "oauthCredentials")]
    fn test_invalid_settings(#[case] raw: Value, #[case] expected_field: &str) {
        match &*parse_err(raw) {
            ErrorKind::InvalidField { field, .. } => assert_eq!(field, expected_field),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_legacy_aliases() {
        let config = Config::parse(&json!({
            "isSetupMode": true,
            "googleOAuthTokensStore": "legacy-tokens",
            "googleOAuthCredentials": { "client_id": "id", "client_secret": "secret", "redirect_uri": "http://localhost" },
        }))
        .unwrap();
        assert_eq!(config.settings.tokens_store, "legacy-tokens");
        assert_eq!(config.settings.oauth_credentials.unwrap().client_id, "id");

        let config =
            Config::parse(&json!({ "isSetupMode": true, "tokensStore": "new", "googleOAuthTokensStore": "old" }))
                .unwrap();
        assert_eq!(config.settings.tokens_store, "new");
    }

    #[test]
    fn test_incomplete_credentials() {
        let err = parse_err(json!({ "isSetupMode": true, "oauthCredentials": { "client_id": "id" } }));
        assert!(matches!(&*err, ErrorKind::MissingField(field) if field == "oauthCredentials.client_secret"));
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({ "operations": null }))]
    fn test_operations_required(#[case] raw: Value) {
        assert!(matches!(&*parse_err(raw), ErrorKind::MissingField(field) if field == "operations"));
    }

    #[rstest]
    #[case(json!({ "operations": [] }))]
    #[case(json!({ "operations": {} }))]
    fn test_operations_must_be_non_empty_array(#[case] raw: Value) {
        assert!(matches!(&*parse_err(raw), ErrorKind::InvalidField { field, .. } if field == "operations"));
    }

    #[rstest]
    #[case(json!({ "type": "folders-create", "folder": "a" }), "\"folders-create\"")]
    #[case(json!({ "folder": "a" }), "(missing)")]
    #[case(json!({ "type": 3, "folder": "a" }), "3")]
    fn test_unknown_operation_type(#[case] operation: Value, #[case] expected: &str) {
        let err = parse_err(json!({ "operations": [{ "type": "folders-delete", "folder": "a" }, operation] }));
        match &*err {
            ErrorKind::UnknownOperationType { field, value } => {
                assert_eq!(field, "operations[1].type");
                assert_eq!(value, expected);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_files_rejected() {
        let err = parse_err(json!({
            "operations": [upload(json!({ "idOrName": "s1springfiles", "files": [] }), json!("a"))],
        }));
        assert!(matches!(&*err, ErrorKind::InvalidField { field, .. } if field == "operations[0].source.files"));
    }

    #[rstest]
    #[case(json!(null), "operations[0].source")]
    #[case(json!({ "files": [{ "key": "a" }] }), "operations[0].source.idOrName")]
    #[case(json!({ "idOrName": "s" }), "operations[0].source.files")]
    #[case(json!({ "idOrName": "s", "files": [{ "name": "a" }] }), "operations[0].source.files[0].key")]
    fn test_missing_source_fields(#[case] source: Value, #[case] expected: &str) {
        let err = parse_err(json!({ "operations": [upload(source, json!("a"))] }));
        assert!(matches!(&*err, ErrorKind::MissingField(field) if field == expected), "{err:?}");
    }

    #[rstest]
    #[case(json!({ "idOrName": "", "files": [{ "key": "a" }] }), "operations[0].source.idOrName")]
    #[case(json!({ "idOrName": "s", "forceCloud": "yes", "files": [{ "key": "a" }] }), "operations[0].source.forceCloud")]
    #[case(json!({ "idOrName": "s", "files": ["a"] }), "operations[0].source.files[0]")]
    #[case(json!({ "idOrName": "s", "files": [{ "key": "a", "name": 1 }] }), "operations[0].source.files[0].name")]
    #[case(
        json!({ "idOrName": "s", "files": [{ "key": "a", "options": { "resource": { "name": false } } }] }),
        "operations[0].source.files[0].options.resource.name"
    )]
    fn test_invalid_source_fields(#[case] source: Value, #[case] expected: &str) {
        let err = parse_err(json!({ "operations": [upload(source, json!("a"))] }));
        assert!(matches!(&*err, ErrorKind::InvalidField { field, .. } if field == expected), "{err:?}");
    }

    #[test]
    fn test_duplicate_file_keys_keep_first_entry() {
        let source = json!({
            "idOrName": "s",
            "files": [{ "key": "a", "name": "x.txt" }, { "key": "b" }, { "key": "a", "name": "y.txt" }],
        });
        let config = Config::parse(&json!({ "operations": [upload(source, json!("a"))] })).unwrap();
        let Operation::Upload(upload) = &config.plan.operations[0] else {
            panic!("expected an upload");
        };
        assert_eq!(upload.source.files, vec![FileRef::new("a").with_name("x.txt"), FileRef::new("b")]);
    }

    #[test]
    fn test_unknown_source_type() {
        let source = json!({ "type": "dataset", "idOrName": "s", "files": [{ "key": "a" }] });
        let err = parse_err(json!({ "operations": [upload(source, json!("a"))] }));
        assert!(matches!(&*err, ErrorKind::UnknownSourceType { value, .. } if value == "\"dataset\""));
    }

    #[test]
    fn test_full_plan() {
        let config = Config::parse(&json!({
            "fileUploadingMaxConcurrency": 3,
            "constants": [
                { "name": "dest", "value": "shared/archive" },
                { "name": "anchored", "value": { "parentFolderId": "ROOT", "path": "old" } },
            ],
            "operations": [
                upload(
                    json!({
                        "idOrName": "reports",
                        "forceCloud": true,
                        "files": [
                            { "key": "q1" },
                            { "key": "q2", "name": "q2.pdf", "options": { "resource": { "name": "Q2.pdf" } } },
                        ],
                    }),
                    json!("constants.dest"),
                ),
                { "type": "folders-delete", "folder": "constants.anchored" },
                { "type": "folders-delete", "folder": { "path": "team/tmp" } },
            ],
        }))
        .unwrap();
        assert_eq!(config.settings.file_uploading_max_concurrency, NonZeroUsize::new(3));
        assert_eq!(config.plan.constants.len(), 2);

        let kinds: Vec<_> = config.plan.operations.iter().map(Operation::kind).collect();
        assert_eq!(kinds, vec![OperationType::Upload, OperationType::DeleteFolder, OperationType::DeleteFolder]);

        let Operation::Upload(upload) = &config.plan.operations[0] else {
            panic!("expected upload");
        };
        assert_eq!(upload.source.kind, SourceKind::KeyValueStore);
        assert!(upload.source.force_cloud);
        assert_eq!(upload.source.files[1].display_name(), "Q2.pdf");
        assert_eq!(upload.destination.to_string(), "{shared}/archive");

        let Operation::DeleteFolder(delete) = &config.plan.operations[1] else {
            panic!("expected delete");
        };
        assert_eq!(delete.folder.anchor(), &Anchor::Id("ROOT".to_string()));
    }

    #[test]
    fn test_folder_errors_name_the_field() {
        let err = parse_err(json!({
            "operations": [
                { "type": "folders-delete", "folder": "team" },
                { "type": "folders-delete", "folder": "constants.missing" },
            ],
        }));
        assert!(matches!(&*err, ErrorKind::InvalidFolder(field) if field == "operations[1].folder"));
        assert!((*err).to_string().contains("operations[1].folder"));
    }

    #[test]
    fn test_missing_destination() {
        let source = json!({ "idOrName": "s", "files": [{ "key": "a" }] });
        let err = parse_err(json!({ "operations": [upload(source, Value::Null)] }));
        assert!(matches!(&*err, ErrorKind::MissingField(field) if field == "operations[0].destination"));
    }

    #[rstest]
    #[case(json!({ "constants": {}, "operations": [] }), "constants")]
    #[case(json!({ "constants": [{ "name": "a", "value": 1 }] }), "constants[0].value")]
    #[case(json!({ "constants": [{ "name": 1, "value": "a" }] }), "constants[0].name")]
    fn test_invalid_constants(#[case] raw: Value, #[case] expected: &str) {
        assert!(matches!(&*parse_err(raw), ErrorKind::InvalidField { field, .. } if field == expected));
    }

    #[test]
    fn test_duplicate_constant() {
        let err = parse_err(json!({
            "constants": [{ "name": "a", "value": "x" }, { "name": "a", "value": "y" }],
            "operations": [{ "type": "folders-delete", "folder": "constants.a" }],
        }));
        assert!(matches!(&*err, ErrorKind::DuplicateConstant(name) if name == "a"));
    }
}

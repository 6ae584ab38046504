//! Loading the raw configuration object.
//!
//! The JSON job description is merged with `KVDRIVE_*` environment
//! overrides for the scalar settings, then handed to
//! [`Config::parse`](crate::Config::parse) as a plain JSON value.

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json};
use figment::value::Uncased;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "KVDRIVE_";
const CONFIG_FILE_NAME: &str = "config.json";
/// Settings that may be overridden from the environment, by their key after
/// the prefix is stripped.
const ENV_OVERRIDES: [&str; 4] =
    ["file_upload_timeout_secs", "file_uploading_max_concurrency", "tokens_store", "is_setup_mode"];

/// `config.json` in the platform configuration directory, if the platform
/// has one.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "kvdrive").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Load the raw configuration object.
///
/// An explicit `path` must exist. Without one, the default location is used
/// when present, and otherwise only the environment contributes.
pub fn load(path: Option<&Path>) -> Result<Value> {
    let path = match path {
        Some(path) if !path.is_file() => exn::bail!(ErrorKind::Load(format!("no such file: {}", path.display()))),
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.is_file()),
    };

    let mut figment = Figment::new();
    if let Some(path) = &path {
        tracing::debug!(path = %path.display(), "Loading configuration file");
        figment = figment.merge(Json::file(path));
    }
    // Keys keep the case produced by `camel_case`.
    let env = Env::prefixed(ENV_PREFIX)
        .only(&ENV_OVERRIDES)
        .map(|key| Uncased::new(camel_case(&key.as_str().to_ascii_lowercase())))
        .lowercase(false);
    figment = figment.merge(env);

    figment.extract::<Value>().or_raise(|| {
        let source = path.as_ref().map_or_else(|| "environment".to_string(), |p| p.display().to_string());
        ErrorKind::Load(source)
    })
}

/// `file_upload_timeout_secs` to `fileUploadTimeoutSecs`.
fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use figment::Jail;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case("tokens_store", "tokensStore")]
    #[case("file_uploading_max_concurrency", "fileUploadingMaxConcurrency")]
    #[case("plain", "plain")]
    fn test_camel_case(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(camel_case(key), expected);
    }

    #[test]
    fn test_file_with_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "job.json",
                r#"{
                    "fileUploadTimeoutSecs": 10,
                    "operations": [{ "type": "folders-delete", "folder": "team/old" }]
                }"#,
            )?;
            jail.set_env("KVDRIVE_FILE_UPLOAD_TIMEOUT_SECS", "30");
            jail.set_env("KVDRIVE_TOKENS_STORE", "my-tokens");
            jail.set_env("KVDRIVE_UNRELATED", "ignored");

            let raw = load(Some(Path::new("job.json"))).unwrap();
            assert!(raw.get("unrelated").is_none());
            let config = Config::parse(&raw).unwrap();
            assert_eq!(config.settings.file_upload_timeout, Duration::from_secs(30));
            assert_eq!(config.settings.tokens_store, "my-tokens");
            assert_eq!(config.plan.operations.len(), 1);
            Ok(())
        });
    }

    #[test]
    fn test_setup_mode_from_env_only() {
        Jail::expect_with(|jail| {
            jail.set_env("KVDRIVE_IS_SETUP_MODE", "true");
            let raw = load(None).unwrap();
            let config = Config::parse(&raw).unwrap();
            assert!(config.settings.is_setup_mode);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|_jail| {
            let err = load(Some(Path::new("nope.json"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load(_)));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file() {
        Jail::expect_with(|jail| {
            jail.create_file("job.json", "{ not json")?;
            let err = load(Some(Path::new("job.json"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load(source) if source == "job.json"));
            Ok(())
        });
    }
}

//! Run-wide settings.

use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

pub const DEFAULT_FILE_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_TOKENS_STORE: &str = "google-oauth-tokens";

/// Global settings, built once by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub is_setup_mode: bool,
    /// Per-file budget covering fetch and upload.
    pub file_upload_timeout: Duration,
    /// `None` leaves the choice to the runner.
    pub file_uploading_max_concurrency: Option<NonZeroUsize>,
    /// Store the external auth collaborator keeps its tokens in.
    pub tokens_store: String,
    #[serde(skip)]
    pub oauth_credentials: Option<OAuthCredentials>,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            is_setup_mode: false,
            file_upload_timeout: DEFAULT_FILE_UPLOAD_TIMEOUT,
            file_uploading_max_concurrency: None,
            tokens_store: DEFAULT_TOKENS_STORE.to_string(),
            oauth_credentials: None,
        }
    }
}

/// OAuth client credentials, handed through to the auth collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}
impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

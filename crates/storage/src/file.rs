//! File references as declared in an upload operation.

use serde::Serialize;

/// A file to upload, addressed by its key in the backing store.
///
/// The name it is uploaded under resolves as `options.resource.name`, then
/// `name`, then the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<FileOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FileRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            options: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_resource_name(mut self, name: impl Into<String>) -> Self {
        self.options = Some(FileOptions {
            resource: Some(ResourceOptions { name: Some(name.into()) }),
        });
        self
    }

    /// Name the file is uploaded under.
    ///
    /// ```
    /// use kvdrive_storage::FileRef;
    ///
    /// assert_eq!(FileRef::new("k").display_name(), "k");
    /// assert_eq!(FileRef::new("k").with_name("n").display_name(), "n");
    /// assert_eq!(FileRef::new("k").with_name("n").with_resource_name("r").display_name(), "r");
    /// ```
    pub fn display_name(&self) -> &str {
        self.options
            .as_ref()
            .and_then(|options| options.resource.as_ref())
            .and_then(|resource| resource.name.as_deref())
            .or(self.name.as_deref())
            .unwrap_or(&self.key)
    }
}

//! Resolved folder identities.
//!
//! A [`FolderPath`] is anchored either to an existing remote folder (by id)
//! or to a top-level folder (by name), with an optional `/`-separated
//! relative path beneath the anchor. Exactly one anchor is always present,
//! which the [`Anchor`] enum enforces at the type level.

use crate::error::{ErrorKind, Result};
use std::fmt;
use std::sync::OnceLock;

/// The parent folder a [`FolderPath`] hangs from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// An existing remote folder, referenced by its id. Never created.
    Id(String),
    /// A top-level folder referenced by name, created on demand.
    Name(String),
}

/// One step of the walk from the anchor down to the target folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Anchor(&'a Anchor),
    Name(&'a str),
}

/// Canonical folder identity on the remote service.
///
/// Immutable once constructed; the display string
/// (`{<parentFolderName>::<parentFolderId>}/<relativePath>`) is rendered on
/// first use and memoized.
///
/// # Examples
///
/// ```
/// use kvdrive_drive::FolderPath;
///
/// let folder = FolderPath::with_parent_name("team", Some("reports/q1".to_string())).unwrap();
/// assert_eq!(folder.parent_folder_name(), Some("team"));
/// assert_eq!(folder.relative_path(), Some("reports/q1"));
/// assert_eq!(folder.to_string(), "{team}/reports/q1");
///
/// let anchored = FolderPath::with_parent_id("0AbC", None).unwrap();
/// assert_eq!(anchored.to_string(), "{::0AbC}");
/// ```
#[derive(Debug, Clone)]
pub struct FolderPath {
    anchor: Anchor,
    relative: Option<String>,
    display: OnceLock<String>,
}
impl FolderPath {
    /// Folder beneath an existing remote folder id. The relative path is
    /// kept verbatim (no splitting into a parent name).
    pub fn with_parent_id(id: impl Into<String>, relative: Option<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            exn::bail!(ErrorKind::InvalidPath("parent folder id must not be empty".to_string()));
        }
        Self::new(Anchor::Id(id), relative)
    }

    /// Folder beneath a top-level folder referenced by name.
    pub fn with_parent_name(name: impl Into<String>, relative: Option<String>) -> Result<Self> {
        let name = name.into();
        validate_segment(&name)?;
        Self::new(Anchor::Name(name), relative)
    }

    fn new(anchor: Anchor, relative: Option<String>) -> Result<Self> {
        // One trailing "/" is dropped; an empty remainder ("team/") is the anchor itself.
        let relative = relative
            .map(|r| match r.strip_suffix('/') {
                Some(trimmed) => trimmed.to_string(),
                None => r,
            })
            .filter(|r| !r.is_empty());
        if let Some(relative) = &relative {
            for segment in relative.split('/') {
                validate_segment(segment).map_err(|_| ErrorKind::InvalidPath(relative.clone()))?;
            }
        }
        Ok(Self {
            anchor,
            relative,
            display: OnceLock::new(),
        })
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn parent_folder_id(&self) -> Option<&str> {
        match &self.anchor {
            Anchor::Id(id) => Some(id),
            Anchor::Name(_) => None,
        }
    }

    pub fn parent_folder_name(&self) -> Option<&str> {
        match &self.anchor {
            Anchor::Name(name) => Some(name),
            Anchor::Id(_) => None,
        }
    }

    pub fn relative_path(&self) -> Option<&str> {
        self.relative.as_deref()
    }

    /// Walk order a client follows to reach (or create) this folder: the
    /// anchor first, then each relative path segment.
    ///
    /// ```
    /// use kvdrive_drive::{Anchor, FolderPath, Segment};
    ///
    /// let folder = FolderPath::with_parent_name("shared", Some("archive/2024".to_string())).unwrap();
    /// let segments: Vec<_> = folder.segments().collect();
    /// assert_eq!(segments, vec![
    ///     Segment::Anchor(&Anchor::Name("shared".to_string())),
    ///     Segment::Name("archive"),
    ///     Segment::Name("2024"),
    /// ]);
    /// ```
    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        std::iter::once(Segment::Anchor(&self.anchor))
            .chain(self.relative.iter().flat_map(|r| r.split('/')).map(Segment::Name))
    }

    /// Memoized display form.
    pub fn as_str(&self) -> &str {
        self.display.get_or_init(|| {
            let parent = match &self.anchor {
                Anchor::Name(name) => name.clone(),
                Anchor::Id(id) => format!("::{id}"),
            };
            match &self.relative {
                Some(relative) => format!("{{{parent}}}/{relative}"),
                None => format!("{{{parent}}}"),
            }
        })
    }
}
impl PartialEq for FolderPath {
    fn eq(&self, other: &Self) -> bool {
        self.anchor == other.anchor && self.relative == other.relative
    }
}
impl Eq for FolderPath {}
impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single folder name: non-empty, no separators, no traversal.
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains(['/', '\0']) {
        exn::bail!(ErrorKind::InvalidPath(segment.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parent_name_anchor() {
        let folder = FolderPath::with_parent_name("team", Some("reports/q1".to_string())).unwrap();
        assert_eq!(folder.anchor(), &Anchor::Name("team".to_string()));
        assert_eq!(folder.parent_folder_id(), None);
        assert_eq!(folder.relative_path(), Some("reports/q1"));
    }

    #[test]
    fn test_parent_id_anchor() {
        let folder = FolderPath::with_parent_id("X", Some("a/b".to_string())).unwrap();
        assert_eq!(folder.parent_folder_id(), Some("X"));
        assert_eq!(folder.parent_folder_name(), None);
        assert_eq!(folder.relative_path(), Some("a/b"));
    }

    #[test]
    fn test_empty_relative_is_unset() {
        let folder = FolderPath::with_parent_name("team", Some(String::new())).unwrap();
        assert_eq!(folder.relative_path(), None);
        assert_eq!(folder, FolderPath::with_parent_name("team", None).unwrap());
    }

    #[rstest]
    #[case(FolderPath::with_parent_name("team", None), "{team}")]
    #[case(FolderPath::with_parent_name("team", Some("reports/q1".to_string())), "{team}/reports/q1")]
    #[case(FolderPath::with_parent_id("X", None), "{::X}")]
    #[case(FolderPath::with_parent_id("X", Some("a/b".to_string())), "{::X}/a/b")]
    #[case(FolderPath::with_parent_name("team", Some("reports/".to_string())), "{team}/reports")]
    #[case(FolderPath::with_parent_id("X", Some("/".to_string())), "{::X}")]
    fn test_display(#[case] folder: Result<FolderPath>, #[case] expected: &str) {
        let folder = folder.unwrap();
        assert_eq!(folder.to_string(), expected);
        // Second render comes from the memoized value.
        assert_eq!(folder.as_str(), expected);
        assert!(std::ptr::eq(folder.as_str(), folder.as_str()));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("a/b")]
    fn test_invalid_parent_name(#[case] name: &str) {
        let err = FolderPath::with_parent_name(name, None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[rstest]
    #[case("a//b")]
    #[case("a/../b")]
    #[case("a/b//")]
    #[case("./a")]
    fn test_invalid_relative_path(#[case] relative: &str) {
        assert!(FolderPath::with_parent_name("team", Some(relative.to_string())).is_err());
        assert!(FolderPath::with_parent_id("X", Some(relative.to_string())).is_err());
    }

    #[test]
    fn test_empty_parent_id_rejected() {
        assert!(FolderPath::with_parent_id("", None).is_err());
    }

    #[test]
    fn test_segments() {
        let folder = FolderPath::with_parent_id("X", Some("a/b".to_string())).unwrap();
        let segments: Vec<_> = folder.segments().collect();
        assert_eq!(
            segments,
            vec![Segment::Anchor(&Anchor::Id("X".to_string())), Segment::Name("a"), Segment::Name("b")]
        );
        let folder = FolderPath::with_parent_name("team", None).unwrap();
        assert_eq!(folder.segments().count(), 1);
    }

    #[test]
    fn test_equality_ignores_display_cache() {
        let rendered = FolderPath::with_parent_name("team", Some("q1".to_string())).unwrap();
        let _ = rendered.as_str();
        let fresh = FolderPath::with_parent_name("team", Some("q1".to_string())).unwrap();
        assert_eq!(rendered, fresh);
    }
}

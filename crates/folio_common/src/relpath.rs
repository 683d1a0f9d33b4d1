//! Validated, forward-slash relative paths.
//!
//! Every path stored inside a component bundle descriptor or a module
//! descriptor is a [`RelPath`]. Absolute paths and parent-directory segments
//! are rejected at construction, so a bundle copied to another directory (or
//! machine) resolves to the same set of files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Reasons a string is not a valid bundle-relative path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelPathError {
    /// The path is empty.
    #[error("relative path is empty")]
    Empty,

    /// The path is absolute or carries a drive/root prefix.
    #[error("path '{0}' is absolute")]
    Absolute(String),

    /// The path contains a `..` segment.
    #[error("path '{0}' escapes its root via '..'")]
    ParentSegment(String),
}

/// A normalized relative path using `/` separators.
///
/// `.` segments and duplicate separators are removed. The empty path is not
/// representable; use [`RelPath::root`] checks at call sites instead.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelPath(String);

impl RelPath {
    /// Parses and normalizes a relative path.
    pub fn new(raw: &str) -> Result<Self, RelPathError> {
        let unified = raw.replace('\\', "/");
        if unified.starts_with('/') || Path::new(raw).is_absolute() || has_drive_prefix(&unified) {
            return Err(RelPathError::Absolute(raw.to_string()));
        }

        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(RelPathError::ParentSegment(raw.to_string())),
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(RelPathError::Empty);
        }
        Ok(Self(segments.join("/")))
    }

    /// Builds a relative path from `path` relative to `base`.
    ///
    /// Returns `None` when `path` is not located under `base`.
    pub fn from_base(base: &Path, path: &Path) -> Option<Self> {
        let stripped = path.strip_prefix(base).ok()?;
        let mut parts = Vec::new();
        for component in stripped.components() {
            match component {
                Component::Normal(s) => parts.push(s.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Self::new(&parts.join("/")).ok()
    }

    /// Appends a child segment (or nested relative path).
    pub fn join(&self, child: &str) -> Result<Self, RelPathError> {
        Self::new(&format!("{}/{}", self.0, child))
    }

    /// Resolves this path against a root directory.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.0.split('/') {
            out.push(segment);
        }
        out
    }

    /// Returns the path as a `/`-separated string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the final segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl TryFrom<String> for RelPath {
    type Error = RelPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RelPath> for String {
    fn from(value: RelPath) -> Self {
        value.0
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelPath({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_dots() {
        let p = RelPath::new("./source-sets//main\\classpath/").unwrap();
        assert_eq!(p.as_str(), "source-sets/main/classpath");
    }

    #[test]
    fn rejects_absolute() {
        assert!(matches!(
            RelPath::new("/tmp/a"),
            Err(RelPathError::Absolute(_))
        ));
        assert!(matches!(
            RelPath::new("C:/tmp/a"),
            Err(RelPathError::Absolute(_))
        ));
    }

    #[test]
    fn rejects_parent_segments() {
        assert!(matches!(
            RelPath::new("module/../../etc"),
            Err(RelPathError::ParentSegment(_))
        ));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(RelPath::new("./"), Err(RelPathError::Empty));
    }

    #[test]
    fn resolve_against_two_roots() {
        let p = RelPath::new("module/index.html").unwrap();
        assert_eq!(
            p.resolve(Path::new("/tmp/A")),
            Path::new("/tmp/A/module/index.html")
        );
        assert_eq!(
            p.resolve(Path::new("/tmp/B")),
            Path::new("/tmp/B/module/index.html")
        );
    }

    #[test]
    fn from_base_inside_and_outside() {
        let base = Path::new("/work/unit");
        let inside = RelPath::from_base(base, Path::new("/work/unit/src/main")).unwrap();
        assert_eq!(inside.as_str(), "src/main");
        assert!(RelPath::from_base(base, Path::new("/elsewhere/src")).is_none());
    }

    #[test]
    fn join_and_file_name() {
        let p = RelPath::new("libs").unwrap().join("core").unwrap();
        assert_eq!(p.as_str(), "libs/core");
        assert_eq!(p.file_name(), "core");
    }

    #[test]
    fn serde_validates() {
        let ok: RelPath = serde_json::from_str("\"a/b\"").unwrap();
        assert_eq!(ok.as_str(), "a/b");
        assert!(serde_json::from_str::<RelPath>("\"../x\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"a/b\"");
    }
}

//! Whole-directory content digests and change detection.
//!
//! A digest maps every file below a root (by `/`-separated relative path) to
//! its content hash. Two trees with equal digests hold the same file set with
//! the same bytes, which is how packaging idempotence and output integrity
//! are checked.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use folio_common::{ContentHash, ContentHasher, RelPath};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Content digest of a directory tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDigest {
    /// File hashes keyed by relative path.
    pub files: BTreeMap<String, ContentHash>,
    /// Relative paths of all directories, including empty ones.
    pub directories: BTreeSet<String>,
}

/// Differences between two digests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Files only in the newer digest.
    pub added: Vec<String>,
    /// Files whose hash changed.
    pub modified: Vec<String>,
    /// Files only in the older digest.
    pub removed: Vec<String>,
}

impl ChangeSet {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

impl DirectoryDigest {
    /// Digests every file under `root`; files are hashed in parallel.
    pub fn compute(root: &Path) -> Result<Self, CacheError> {
        let mut files = Vec::new();
        let mut directories = BTreeSet::new();
        walk(root, root, &mut files, &mut directories)?;

        let hashed = files
            .par_iter()
            .map(|(rel, path)| {
                let bytes = std::fs::read(path).map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok((rel.clone(), ContentHash::from_bytes(&bytes)))
            })
            .collect::<Result<BTreeMap<_, _>, CacheError>>()?;

        Ok(Self {
            files: hashed,
            directories,
        })
    }

    /// A single hash over the whole tree.
    pub fn combined(&self) -> ContentHash {
        let mut hasher = ContentHasher::new();
        for dir in &self.directories {
            hasher.update(b"d").update(dir.as_bytes());
        }
        for (path, hash) in &self.files {
            hasher.update(b"f").update(path.as_bytes()).update(hash.as_bytes());
        }
        hasher.finish()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the tree holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Lists the file changes from `self` (older) to `newer`.
    pub fn diff(&self, newer: &DirectoryDigest) -> ChangeSet {
        let mut changes = ChangeSet::default();
        for (path, hash) in &newer.files {
            match self.files.get(path) {
                Some(old) if old == hash => {}
                Some(_) => changes.modified.push(path.clone()),
                None => changes.added.push(path.clone()),
            }
        }
        changes.removed = self
            .files
            .keys()
            .filter(|p| !newer.files.contains_key(*p))
            .cloned()
            .collect();
        changes
    }
}

fn walk(
    root: &Path,
    dir: &Path,
    files: &mut Vec<(String, PathBuf)>,
    directories: &mut BTreeSet<String>,
) -> Result<(), CacheError> {
    let io = |source| CacheError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io)? {
        let entry = entry.map_err(io)?;
        let path = entry.path();
        let Some(rel) = RelPath::from_base(root, &path) else {
            continue;
        };
        let file_type = entry.file_type().map_err(io)?;
        if file_type.is_dir() {
            directories.insert(rel.as_str().to_string());
            walk(root, &path, files, directories)?;
        } else if file_type.is_symlink() && path.is_dir() {
            // Linked directories are not part of the tree.
            continue;
        } else {
            files.push((rel.as_str().to_string(), path));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(root: &Path) {
        std::fs::create_dir_all(root.join("module/hello")).unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("component.json"), "{}").unwrap();
        std::fs::write(root.join("module/hello/index.html"), "<html/>").unwrap();
    }

    #[test]
    fn identical_trees_have_identical_digests() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        tree(a.path());
        tree(b.path());
        let da = DirectoryDigest::compute(a.path()).unwrap();
        let db = DirectoryDigest::compute(b.path()).unwrap();
        assert_eq!(da, db);
        assert_eq!(da.combined(), db.combined());
        assert_eq!(da.len(), 2);
        assert!(da.files.contains_key("module/hello/index.html"));
        assert!(da.directories.contains("empty"));
    }

    #[test]
    fn content_change_is_detected() {
        let tmp = tempfile::tempdir().unwrap();
        tree(tmp.path());
        let before = DirectoryDigest::compute(tmp.path()).unwrap();
        std::fs::write(tmp.path().join("component.json"), "{\"x\":1}").unwrap();
        std::fs::write(tmp.path().join("new.txt"), "n").unwrap();
        std::fs::remove_file(tmp.path().join("module/hello/index.html")).unwrap();
        let after = DirectoryDigest::compute(tmp.path()).unwrap();

        let changes = before.diff(&after);
        assert_eq!(changes.modified, vec!["component.json"]);
        assert_eq!(changes.added, vec!["new.txt"]);
        assert_eq!(changes.removed, vec!["module/hello/index.html"]);
        assert_ne!(before.combined(), after.combined());
    }

    #[test]
    fn empty_directory_changes_combined_hash() {
        let tmp = tempfile::tempdir().unwrap();
        tree(tmp.path());
        let before = DirectoryDigest::compute(tmp.path()).unwrap();
        std::fs::remove_dir(tmp.path().join("empty")).unwrap();
        let after = DirectoryDigest::compute(tmp.path()).unwrap();
        assert!(before.diff(&after).is_empty());
        assert_ne!(before.combined(), after.combined());
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(DirectoryDigest::compute(Path::new("/nonexistent/folio/out")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        tree(tmp.path());
        let before = DirectoryDigest::compute(tmp.path()).unwrap();
        std::os::unix::fs::symlink(tmp.path(), tmp.path().join("module/loop")).unwrap();
        let after = DirectoryDigest::compute(tmp.path()).unwrap();
        assert_eq!(before, after);
    }
}

//! Mirroring a plan into a bundle directory.

use std::collections::BTreeSet;
use std::path::Path;

use folio_common::RelPath;
use tracing::{debug, info};

use crate::error::BundleError;
use crate::plan::{Entry, SyncPlan};

/// What a sync changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files created or rewritten.
    pub written: usize,
    /// Files already holding the planned content.
    pub unchanged: usize,
    /// Stale files and directories deleted.
    pub removed: usize,
}

impl SyncPlan {
    /// Makes `dest` hold exactly this plan's tree.
    ///
    /// Files and directories that are not planned are deleted. Files whose
    /// content already matches are not rewritten.
    pub fn sync(&self, dest: &Path) -> Result<SyncReport, BundleError> {
        std::fs::create_dir_all(dest).map_err(BundleError::io(dest))?;
        let mut report = SyncReport::default();

        let mut existing_files = Vec::new();
        let mut existing_dirs = BTreeSet::new();
        scan(dest, dest, &mut existing_files, &mut existing_dirs)?;

        for rel in existing_files {
            if !self.files.contains_key(&rel) {
                let path = rel.resolve(dest);
                debug!(path = %rel, "removing stale file");
                std::fs::remove_file(&path).map_err(BundleError::io(&path))?;
                report.removed += 1;
            }
        }
        // Children sort after their parents, so reverse order is deepest first.
        for rel in existing_dirs.iter().rev() {
            if !self.directories.contains(rel) {
                let path = rel.resolve(dest);
                if path.exists() {
                    debug!(path = %rel, "removing stale directory");
                    std::fs::remove_dir_all(&path).map_err(BundleError::io(&path))?;
                    report.removed += 1;
                }
            }
        }

        for rel in &self.directories {
            let path = rel.resolve(dest);
            std::fs::create_dir_all(&path).map_err(BundleError::io(&path))?;
        }
        for (rel, entry) in &self.files {
            let target = rel.resolve(dest);
            let bytes = match entry {
                Entry::Copy(src) => std::fs::read(src).map_err(BundleError::io(src))?,
                Entry::Generated(bytes) => bytes.clone(),
            };
            if target.is_file() && std::fs::read(&target).ok().as_deref() == Some(bytes.as_slice()) {
                report.unchanged += 1;
                continue;
            }
            std::fs::write(&target, &bytes).map_err(BundleError::io(&target))?;
            report.written += 1;
        }

        info!(
            bundle = %dest.display(),
            written = report.written,
            unchanged = report.unchanged,
            removed = report.removed,
            "synced component bundle"
        );
        Ok(report)
    }
}

fn scan(
    root: &Path,
    dir: &Path,
    files: &mut Vec<RelPath>,
    directories: &mut BTreeSet<RelPath>,
) -> Result<(), BundleError> {
    for entry in std::fs::read_dir(dir).map_err(BundleError::io(dir))? {
        let entry = entry.map_err(BundleError::io(dir))?;
        let path = entry.path();
        let Some(rel) = RelPath::from_base(root, &path) else {
            continue;
        };
        if entry.file_type().map_err(BundleError::io(&path))?.is_dir() {
            scan(root, &path, files, directories)?;
            directories.insert(rel);
        } else {
            files.push(rel);
        }
    }
    Ok(())
}

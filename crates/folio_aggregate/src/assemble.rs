//! Nesting module outputs and writing the merged root artifacts.

use std::path::Path;

use folio_attrs::Format;
use folio_common::RelPath;
use folio_params::ModuleManifest;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AggregateError;
use crate::index::{index_file, render_index};
use crate::package_list::{find_package_list, merge_package_lists, ModulePackages, PACKAGE_LIST_FILE};
use crate::validate::validate_modules;

/// Module listing written at the aggregate root.
pub const NAVIGATION_FILE: &str = "navigation.json";

#[derive(Serialize)]
struct Navigation<'a> {
    modules: Vec<NavigationEntry<'a>>,
}

#[derive(Serialize)]
struct NavigationEntry<'a> {
    name: &'a str,
    path: &'a str,
}

/// What an aggregation wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateReport {
    /// Modules merged.
    pub modules: usize,
    /// Module files copied because the engine had not placed them.
    pub copied_files: usize,
    /// Whether the fallback index was written.
    pub wrote_fallback_index: bool,
}

/// Completes one publication's output tree.
pub struct Aggregator<'a> {
    unit: &'a str,
    title: &'a str,
    format: &'a Format,
    output_root: &'a Path,
}

impl<'a> Aggregator<'a> {
    /// An aggregator for `unit` writing under `output_root`.
    ///
    /// `title` heads the fallback index; it is normally the unit's module name.
    pub fn new(unit: &'a str, title: &'a str, format: &'a Format, output_root: &'a Path) -> Self {
        Self {
            unit,
            title,
            format,
            output_root,
        }
    }

    /// Nests every module under its path and writes the root artifacts.
    ///
    /// Files the engine already wrote are never overwritten, so pages it
    /// post-processed keep their content.
    pub fn assemble(&self, modules: &[ModuleManifest]) -> Result<AggregateReport, AggregateError> {
        validate_modules(self.unit, modules)?;
        let mut sorted: Vec<&ModuleManifest> = modules.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let root = self.output_root;
        std::fs::create_dir_all(root).map_err(AggregateError::io(root))?;

        let mut report = AggregateReport {
            modules: sorted.len(),
            ..AggregateReport::default()
        };
        let mut packages = Vec::with_capacity(sorted.len());
        let mut entries = Vec::with_capacity(sorted.len());
        for module in &sorted {
            let path = RelPath::new(&module.module_path).map_err(|source| {
                AggregateError::InvalidModulePath {
                    unit: self.unit.to_string(),
                    module: module.name.clone(),
                    source,
                }
            })?;
            let copied = copy_missing(&module.source_output_directory, &path.resolve(root))?;
            debug!(module = %module.name, path = %path, copied, "nested module output");
            report.copied_files += copied;

            let lines = match find_package_list(&module.source_output_directory, &module.name) {
                Some(list) => {
                    let content =
                        std::fs::read_to_string(&list).map_err(AggregateError::io(&list))?;
                    ModulePackages::parse(&module.name, &content)
                }
                None => ModulePackages::parse(&module.name, ""),
            };
            packages.push(lines);
            entries.push((module.name.clone(), path.to_string()));
        }

        let package_list = root.join(PACKAGE_LIST_FILE);
        std::fs::write(&package_list, merge_package_lists(self.format, &packages))
            .map_err(AggregateError::io(&package_list))?;

        let navigation = Navigation {
            modules: entries
                .iter()
                .map(|(name, path)| NavigationEntry { name, path })
                .collect(),
        };
        let mut nav_json = serde_json::to_vec_pretty(&navigation)?;
        nav_json.push(b'\n');
        let nav_path = root.join(NAVIGATION_FILE);
        std::fs::write(&nav_path, nav_json).map_err(AggregateError::io(&nav_path))?;

        let index = root.join(index_file(self.format));
        if !index.exists() {
            std::fs::write(&index, render_index(self.title, self.format, &entries))
                .map_err(AggregateError::io(&index))?;
            report.wrote_fallback_index = true;
        }

        info!(
            unit = self.unit,
            format = %self.format,
            modules = report.modules,
            copied = report.copied_files,
            "aggregated publication"
        );
        Ok(report)
    }
}

/// Copies files from `src` that do not yet exist below `dst`.
fn copy_missing(src: &Path, dst: &Path) -> Result<usize, AggregateError> {
    std::fs::create_dir_all(dst).map_err(AggregateError::io(dst))?;
    let mut copied = 0;
    for entry in std::fs::read_dir(src).map_err(AggregateError::io(src))? {
        let entry = entry.map_err(AggregateError::io(src))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if entry.file_type().map_err(AggregateError::io(&from))?.is_dir() {
            copied += copy_missing(&from, &to)?;
        } else if !to.exists() {
            std::fs::copy(&from, &to).map_err(AggregateError::io(&to))?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_missing_keeps_existing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        std::fs::create_dir_all(src.join("a")).unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(src.join("a/page.html"), "raw").unwrap();
        std::fs::write(src.join("index.html"), "raw index").unwrap();
        std::fs::write(dst.join("index.html"), "processed index").unwrap();

        let copied = copy_missing(&src, &dst).unwrap();
        assert_eq!(copied, 1);
        assert_eq!(std::fs::read_to_string(dst.join("index.html")).unwrap(), "processed index");
        assert_eq!(std::fs::read_to_string(dst.join("a/page.html")).unwrap(), "raw");
    }
}

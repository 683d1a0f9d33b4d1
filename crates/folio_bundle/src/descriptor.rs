//! The `component.json` descriptor.

use folio_common::RelPath;
use folio_params::{ModuleDescriptor, SourceSetId};
use serde::{Deserialize, Serialize};

/// Descriptor layout version. Bundles with another version are rejected.
pub const DESCRIPTOR_VERSION: u32 = 1;

/// Maps everything a bundle carries to paths relative to its root.
///
/// Absolute or escaping paths fail to deserialize, so a descriptor read
/// back from disk can only name files inside the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    /// Layout version.
    pub format_version: u32,
    /// Identity of the packaged module.
    pub module: ModuleDescriptor,
    /// Generated module output, when the bundle carries one.
    pub module_output: Option<RelPath>,
    /// Top-level include files.
    pub includes: Vec<RelPath>,
    /// Packaged source sets in name order.
    pub source_sets: Vec<SourceSetEntry>,
}

/// One source set's files inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSetEntry {
    /// The source set's id.
    pub id: SourceSetId,
    /// Directory holding this source set's files.
    pub directory: RelPath,
    /// Source roots.
    pub source_roots: Vec<RelPath>,
    /// Classpath entries.
    pub classpath: Vec<RelPath>,
    /// Sample files or directories.
    pub samples: Vec<RelPath>,
    /// Include files.
    pub includes: Vec<RelPath>,
    /// Suppressed files.
    pub suppressed_files: Vec<RelPath>,
}

impl ComponentDescriptor {
    /// Every path the descriptor references.
    pub fn paths(&self) -> Vec<&RelPath> {
        let mut out: Vec<&RelPath> = self.module_output.iter().collect();
        out.extend(&self.includes);
        for ss in &self.source_sets {
            out.push(&ss.directory);
            out.extend(&ss.source_roots);
            out.extend(&ss.classpath);
            out.extend(&ss.samples);
            out.extend(&ss.includes);
            out.extend(&ss.suppressed_files);
        }
        out
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    #[test]
    fn paths_cover_every_section() {
        let d = ComponentDescriptor {
            format_version: DESCRIPTOR_VERSION,
            module: ModuleDescriptor {
                name: "hello".to_string(),
                module_path: "hello".to_string(),
            },
            module_output: Some(rel("module")),
            includes: vec![rel("includes/0-Module.md")],
            source_sets: vec![SourceSetEntry {
                id: SourceSetId::new("hello", "main"),
                directory: rel("source-sets/main"),
                source_roots: vec![rel("source-sets/main/sources/0-kotlin")],
                classpath: vec![rel("source-sets/main/classpath/0-a.jar")],
                samples: Vec::new(),
                includes: Vec::new(),
                suppressed_files: Vec::new(),
            }],
        };
        let paths: Vec<&str> = d.paths().iter().map(|p| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "module",
                "includes/0-Module.md",
                "source-sets/main",
                "source-sets/main/sources/0-kotlin",
                "source-sets/main/classpath/0-a.jar",
            ]
        );
    }

    #[test]
    fn absolute_paths_are_rejected_on_read() {
        let json = r#"{
            "formatVersion": 1,
            "module": {"name": "hello", "modulePath": "hello"},
            "moduleOutput": "/tmp/A/module",
            "includes": [],
            "sourceSets": []
        }"#;
        assert!(serde_json::from_str::<ComponentDescriptor>(json).is_err());
    }

    #[test]
    fn escaping_paths_are_rejected_on_read() {
        let json = r#"{
            "formatVersion": 1,
            "module": {"name": "hello", "modulePath": "hello"},
            "moduleOutput": null,
            "includes": ["../outside.md"],
            "sourceSets": []
        }"#;
        assert!(serde_json::from_str::<ComponentDescriptor>(json).is_err());
    }
}

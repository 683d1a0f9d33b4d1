//! Opening bundles produced by another unit.

use std::path::{Path, PathBuf};

use folio_common::RelPath;
use folio_params::{ModuleDescriptor, ModuleManifest, SourceSetId};
use tracing::debug;

use crate::descriptor::{ComponentDescriptor, DESCRIPTOR_VERSION};
use crate::error::BundleError;
use crate::{DESCRIPTOR_FILE, MODULE_DESCRIPTOR_FILE};

/// A bundle whose descriptor has been read and checked against its tree.
#[derive(Debug, Clone)]
pub struct ComponentBundle {
    root: PathBuf,
    descriptor: ComponentDescriptor,
}

/// A packaged source set with paths resolved against the bundle root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledSourceSet {
    /// The source set's id.
    pub id: SourceSetId,
    /// Source roots.
    pub source_roots: Vec<PathBuf>,
    /// Classpath entries.
    pub classpath: Vec<PathBuf>,
    /// Samples.
    pub samples: Vec<PathBuf>,
    /// Include files.
    pub includes: Vec<PathBuf>,
    /// Suppressed files.
    pub suppressed_files: Vec<PathBuf>,
}

impl ComponentBundle {
    /// Opens the bundle at `root`.
    ///
    /// Fails with [`BundleError::Stale`] if either descriptor or any path
    /// `component.json` names is missing. The module identity must agree
    /// between the two descriptors.
    pub fn open(root: &Path) -> Result<Self, BundleError> {
        let path = root.join(DESCRIPTOR_FILE);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BundleError::Stale {
                    bundle: root.to_path_buf(),
                    path: DESCRIPTOR_FILE.to_string(),
                })
            }
            Err(source) => return Err(BundleError::Io { path, source }),
        };
        let descriptor: ComponentDescriptor =
            serde_json::from_slice(&bytes).map_err(|e| BundleError::Descriptor {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if descriptor.format_version != DESCRIPTOR_VERSION {
            return Err(BundleError::Descriptor {
                path,
                reason: format!(
                    "unsupported format version {} (expected {DESCRIPTOR_VERSION})",
                    descriptor.format_version
                ),
            });
        }

        for rel in descriptor.paths() {
            if !rel.resolve(root).exists() {
                return Err(BundleError::Stale {
                    bundle: root.to_path_buf(),
                    path: rel.as_str().to_string(),
                });
            }
        }
        let module = read_module_descriptor(root)?;
        if module != descriptor.module {
            return Err(BundleError::Descriptor {
                path: root.join(MODULE_DESCRIPTOR_FILE),
                reason: format!(
                    "names module '{}' but {DESCRIPTOR_FILE} packages '{}'",
                    module.name, descriptor.module.name
                ),
            });
        }
        debug!(bundle = %root.display(), module = %descriptor.module.name, "opened component bundle");
        Ok(Self {
            root: root.to_path_buf(),
            descriptor,
        })
    }

    /// The bundle root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The parsed descriptor.
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    /// Identity of the packaged module.
    pub fn module(&self) -> &ModuleDescriptor {
        &self.descriptor.module
    }

    /// The module as an aggregation input, if the bundle carries its output.
    pub fn module_manifest(&self) -> Option<ModuleManifest> {
        let output = self.descriptor.module_output.as_ref()?;
        Some(ModuleManifest {
            name: self.descriptor.module.name.clone(),
            module_path: self.descriptor.module.module_path.clone(),
            source_output_directory: output.resolve(&self.root),
            includes: self.resolve_all(&self.descriptor.includes),
        })
    }

    /// Top-level include files.
    pub fn includes(&self) -> Vec<PathBuf> {
        self.resolve_all(&self.descriptor.includes)
    }

    /// Packaged source sets.
    pub fn source_sets(&self) -> Vec<BundledSourceSet> {
        self.descriptor
            .source_sets
            .iter()
            .map(|ss| BundledSourceSet {
                id: ss.id.clone(),
                source_roots: self.resolve_all(&ss.source_roots),
                classpath: self.resolve_all(&ss.classpath),
                samples: self.resolve_all(&ss.samples),
                includes: self.resolve_all(&ss.includes),
                suppressed_files: self.resolve_all(&ss.suppressed_files),
            })
            .collect()
    }

    fn resolve_all(&self, paths: &[RelPath]) -> Vec<PathBuf> {
        paths.iter().map(|p| p.resolve(&self.root)).collect()
    }
}

/// Reads `module-descriptor.json` from a bundle root.
fn read_module_descriptor(root: &Path) -> Result<ModuleDescriptor, BundleError> {
    let path = root.join(MODULE_DESCRIPTOR_FILE);
    let bytes = std::fs::read(&path).map_err(|_| BundleError::Stale {
        bundle: root.to_path_buf(),
        path: MODULE_DESCRIPTOR_FILE.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| BundleError::Descriptor {
        path,
        reason: e.to_string(),
    })
}

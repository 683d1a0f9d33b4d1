//! The file layout of a bundle, computed before anything is written.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use folio_common::{ContentHash, ContentHasher, RelPath};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::descriptor::{ComponentDescriptor, SourceSetEntry, DESCRIPTOR_VERSION};
use crate::error::BundleError;
use crate::spec::BundleSpec;
use crate::{DESCRIPTOR_FILE, INCLUDES_DIR, MODULE_DESCRIPTOR_FILE, MODULE_DIR, SOURCE_SETS_DIR};

/// Content of one planned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Copied from an input file.
    Copy(PathBuf),
    /// Written by the packager.
    Generated(Vec<u8>),
}

/// The exact tree a bundle directory must hold.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub(crate) files: BTreeMap<RelPath, Entry>,
    pub(crate) directories: BTreeSet<RelPath>,
    descriptor: ComponentDescriptor,
}

impl SyncPlan {
    /// Lays out `spec`.
    ///
    /// Inputs are placed at `<group>/<index>-<file name>` so that two inputs
    /// with the same file name never collide. Missing inputs other than the
    /// module output are skipped with a warning.
    pub fn build(spec: &BundleSpec) -> Result<Self, BundleError> {
        let mut planner = Planner {
            unit: &spec.unit,
            files: BTreeMap::new(),
            directories: BTreeSet::new(),
        };

        let module_output = match &spec.module_output {
            Some(dir) if dir.is_dir() => {
                let target = RelPath::new(MODULE_DIR)?;
                planner.add_tree(&target, dir)?;
                Some(target)
            }
            Some(dir) => {
                return Err(BundleError::MissingModuleOutput {
                    unit: spec.unit.clone(),
                    path: dir.clone(),
                })
            }
            None => None,
        };

        let includes = planner.add_group(&RelPath::new(INCLUDES_DIR)?, &spec.includes)?;

        let mut source_sets = Vec::with_capacity(spec.source_sets.len());
        for ss in &spec.source_sets {
            let directory = RelPath::new(SOURCE_SETS_DIR)?.join(&ss.id.name)?;
            planner.add_dir(&directory);
            source_sets.push(SourceSetEntry {
                id: ss.id.clone(),
                source_roots: planner.add_group(&directory.join("sources")?, &ss.source_roots)?,
                classpath: planner.add_group(&directory.join("classpath")?, &ss.classpath)?,
                samples: planner.add_group(&directory.join("samples")?, &ss.samples)?,
                includes: planner.add_group(&directory.join("includes")?, &ss.includes)?,
                suppressed_files: planner
                    .add_group(&directory.join("suppressed")?, &ss.suppressed_files)?,
                directory,
            });
        }

        let descriptor = ComponentDescriptor {
            format_version: DESCRIPTOR_VERSION,
            module: spec.module.clone(),
            module_output,
            includes,
            source_sets,
        };
        let mut module_json = serde_json::to_vec_pretty(&spec.module)?;
        module_json.push(b'\n');
        planner.generate(RelPath::new(DESCRIPTOR_FILE)?, descriptor.to_json()?);
        planner.generate(RelPath::new(MODULE_DESCRIPTOR_FILE)?, module_json);

        debug!(
            unit = %spec.unit,
            files = planner.files.len(),
            directories = planner.directories.len(),
            "planned component bundle"
        );
        Ok(Self {
            files: planner.files,
            directories: planner.directories,
            descriptor,
        })
    }

    /// The descriptor this plan writes.
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    /// Planned files in path order.
    pub fn files(&self) -> impl Iterator<Item = (&RelPath, &Entry)> {
        self.files.iter()
    }

    /// Hash over the planned layout and the content of every input.
    ///
    /// Two plans with the same fingerprint produce the same tree, which
    /// makes this the cache key of a packaging step.
    pub fn fingerprint(&self) -> Result<ContentHash, BundleError> {
        let hashed = self
            .files
            .par_iter()
            .map(|(rel, entry)| {
                let hash = match entry {
                    Entry::Copy(src) => {
                        ContentHash::from_bytes(&std::fs::read(src).map_err(BundleError::io(src))?)
                    }
                    Entry::Generated(bytes) => ContentHash::from_bytes(bytes),
                };
                Ok((rel, hash))
            })
            .collect::<Result<Vec<_>, BundleError>>()?;

        let mut hasher = ContentHasher::new();
        for dir in &self.directories {
            hasher.update(b"d").update(dir.as_str().as_bytes());
        }
        for (rel, hash) in hashed {
            hasher
                .update(b"f")
                .update(rel.as_str().as_bytes())
                .update(hash.as_bytes());
        }
        Ok(hasher.finish())
    }
}

struct Planner<'a> {
    unit: &'a str,
    files: BTreeMap<RelPath, Entry>,
    directories: BTreeSet<RelPath>,
}

impl Planner<'_> {
    /// Records `dir` and all of its ancestors.
    fn add_dir(&mut self, dir: &RelPath) {
        let mut prefix = String::new();
        for segment in dir.as_str().split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            if let Ok(p) = RelPath::new(&prefix) {
                self.directories.insert(p);
            }
        }
    }

    fn add_file(&mut self, target: RelPath, entry: Entry) {
        if let Some((parent, _)) = target.as_str().rsplit_once('/') {
            if let Ok(parent) = RelPath::new(parent) {
                self.add_dir(&parent);
            }
        }
        self.files.insert(target, entry);
    }

    fn generate(&mut self, target: RelPath, bytes: Vec<u8>) {
        self.add_file(target, Entry::Generated(bytes));
    }

    /// Plans each input under `base`, returning the placed paths.
    fn add_group(&mut self, base: &RelPath, inputs: &[PathBuf]) -> Result<Vec<RelPath>, BundleError> {
        let mut placed = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            if !input.exists() {
                warn!(unit = self.unit, path = %input.display(), "skipping missing bundle input");
                continue;
            }
            let target = base.join(&format!("{index}-{}", file_name(input)))?;
            if input.is_dir() {
                self.add_tree(&target, input)?;
            } else {
                self.add_file(target.clone(), Entry::Copy(input.clone()));
            }
            placed.push(target);
        }
        Ok(placed)
    }

    /// Plans every file below `src` under `target`, keeping empty directories.
    ///
    /// Symlinked directories are not descended into.
    fn add_tree(&mut self, target: &RelPath, src: &Path) -> Result<(), BundleError> {
        self.add_dir(target);
        let mut entries = std::fs::read_dir(src)
            .map_err(BundleError::io(src))?
            .map(|e| e.and_then(|e| Ok((e.path(), e.file_type()?))))
            .collect::<Result<Vec<_>, _>>()
            .map_err(BundleError::io(src))?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (path, file_type) in entries {
            let child = target.join(&file_name(&path))?;
            if file_type.is_dir() {
                self.add_tree(&child, &path)?;
            } else if file_type.is_symlink() && path.is_dir() {
                warn!(unit = self.unit, path = %path.display(), "skipping symlinked directory");
            } else {
                self.add_file(child, Entry::Copy(path));
            }
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}

//! What a unit packages, as plain values.

use folio_config::ResolvedUnit;
use folio_params::{ModuleDescriptor, SourceSetId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the packager needs for one unit and format.
///
/// Built from a [`ResolvedUnit`] before execution; packaging reads only
/// this value and the files it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSpec {
    /// The packaging unit's id.
    pub unit: String,
    /// Module identity written to the descriptors.
    pub module: ModuleDescriptor,
    /// Generated module output to include.
    pub module_output: Option<PathBuf>,
    /// Top-level include files.
    pub includes: Vec<PathBuf>,
    /// Source sets to package.
    pub source_sets: Vec<SourceSetInputs>,
}

/// Absolute input paths of one source set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSetInputs {
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

impl BundleSpec {
    /// The bundle of `unit`, leaving out suppressed source sets.
    pub fn for_unit(unit: &ResolvedUnit, module_output: Option<PathBuf>) -> Self {
        let source_sets = unit
            .source_sets
            .iter()
            .filter(|ss| !ss.suppress)
            .map(|ss| SourceSetInputs {
                id: SourceSetId::new(unit.id.clone(), ss.name.clone()),
                source_roots: ss.source_roots.clone(),
                classpath: ss.classpath.clone(),
                samples: ss.samples.clone(),
                includes: ss.includes.clone(),
                suppressed_files: ss.suppressed_files.clone(),
            })
            .collect();
        Self {
            unit: unit.id.clone(),
            module: ModuleDescriptor {
                name: unit.module_name.clone(),
                module_path: unit.module_path.as_str().to_string(),
            },
            module_output,
            includes: unit.includes.clone(),
            source_sets,
        }
    }
}

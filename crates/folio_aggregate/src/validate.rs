//! Checks run before an aggregation run is dispatched.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use folio_attrs::Format;
use folio_common::RelPath;
use folio_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use folio_params::ModuleManifest;
use tracing::warn;

use crate::error::AggregateError;

/// File-name prefix of the engine plugin that builds cross-module pages.
pub const AGGREGATION_PLUGIN: &str = "all-modules-page-plugin";

/// Rejects duplicate module names and module paths.
pub fn validate_modules(unit: &str, modules: &[ModuleManifest]) -> Result<(), AggregateError> {
    let mut names = BTreeSet::new();
    let mut paths: BTreeMap<RelPath, &str> = BTreeMap::new();
    for module in modules {
        if !names.insert(module.name.as_str()) {
            return Err(AggregateError::DuplicateModuleName {
                unit: unit.to_string(),
                name: module.name.clone(),
            });
        }
        let path = RelPath::new(&module.module_path).map_err(|source| {
            AggregateError::InvalidModulePath {
                unit: unit.to_string(),
                module: module.name.clone(),
                source,
            }
        })?;
        if let Some(first) = paths.insert(path.clone(), module.name.as_str()) {
            return Err(AggregateError::DuplicateModulePath {
                unit: unit.to_string(),
                path: path.to_string(),
                first: first.to_string(),
                second: module.name.clone(),
            });
        }
    }
    Ok(())
}

/// Warns when more than one module is aggregated but no jar on the
/// generator classpath is the aggregation plugin.
///
/// Returns `true` if the plugin is present or not needed.
pub fn check_aggregation_plugin(
    unit: &str,
    format: &Format,
    module_count: usize,
    generator_classpath: &[PathBuf],
    sink: &DiagnosticSink,
) -> bool {
    if module_count <= 1 {
        return true;
    }
    let present = generator_classpath.iter().any(|jar| {
        jar.file_name()
            .map(|n| n.to_string_lossy().starts_with(AGGREGATION_PLUGIN))
            .unwrap_or(false)
    });
    if !present {
        warn!(unit, format = %format, modules = module_count, "aggregation plugin missing");
        sink.emit(
            Diagnostic::warning(
                DiagnosticCode::MISSING_AGGREGATION_PLUGIN,
                format!(
                    "aggregating {module_count} modules for format '{format}' without the \
                     '{AGGREGATION_PLUGIN}' plugin; cross-module pages will be incomplete"
                ),
            )
            .in_unit(unit)
            .with_note(format!(
                "the plugin is normally added to the generator classpath by [formats.{format}] \
                 plugins in the workspace folio.toml"
            ))
            .with_help(format!(
                "add the {AGGREGATION_PLUGIN} jar to [formats.{format}] plugins"
            )),
        );
    }
    present
}

//! The `folio manifest` command: prints the manifest a unit would hand to the engine.

use std::collections::BTreeMap;
use std::io::Write;

use folio_attrs::{ComponentKind, Format};
use folio_channels::UnitId;
use folio_config::{load_workspace, ResolvedUnit};
use folio_diagnostics::DiagnosticSink;
use folio_params::{to_json, GenerationMode, ManifestBuilder};

use crate::layout::UnitLayout;
use crate::pipeline::{render_diagnostics, resolve_workspace_root, select_unit, unit_for_cwd};
use crate::plan::build_registry;
use crate::steps::{packaged_modules, resolve_reporting};
use crate::{GlobalArgs, ManifestArgs, ModeArg};

/// Runs the manifest command.
pub fn run(args: &ManifestArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_workspace_root(global)?;
    let workspace = load_workspace(&root)?;
    let id = match &args.unit {
        Some(unit) => select_unit(&workspace, unit)?,
        None => unit_for_cwd(&workspace)?,
    };
    let units: BTreeMap<String, ResolvedUnit> = workspace
        .resolve_units()?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();
    let unit = units
        .get(&id)
        .ok_or_else(|| format!("unknown build unit '{id}'"))?;

    let format = match &args.format {
        Some(name) => Format::new(name)?,
        None => unit
            .formats
            .first()
            .cloned()
            .ok_or_else(|| format!("build unit '{id}' has no formats"))?,
    };
    if !unit.formats.contains(&format) {
        return Err(format!("build unit '{id}' does not generate format '{format}'").into());
    }

    let registry = build_registry(&units)?;
    let mode = match args.mode {
        Some(ModeArg::Module) => GenerationMode::Module,
        Some(ModeArg::Publication) => GenerationMode::Publication,
        None => default_mode(unit, !registry.dependents(&UnitId::new(&id)).is_empty()),
    };

    let sink = DiagnosticSink::new();
    let modules = if mode == GenerationMode::Publication {
        packaged_modules(&registry, &sink, &id, &format)?
    } else {
        Vec::new()
    };
    let plugins =
        resolve_reporting(&registry, &sink, &id, ComponentKind::PluginsClasspath, &format)?.files;
    let manifest = ManifestBuilder::new(unit, mode, UnitLayout::new(&unit.dir, &format).output(mode))
        .plugins_classpath(plugins)
        .modules(modules)
        .diagnostics(&sink)
        .build()?;

    std::io::stdout().write_all(&to_json(&manifest)?)?;
    render_diagnostics(&sink, global);
    Ok(0)
}

/// The mode `folio generate` would use for the unit's first step.
fn default_mode(unit: &ResolvedUnit, consumed: bool) -> GenerationMode {
    if consumed && unit.module_dependencies.is_empty() {
        GenerationMode::Module
    } else {
        GenerationMode::Publication
    }
}

//! Builds a [`ParameterManifest`] from a resolved build unit.

use crate::error::ParamsError;
use crate::links::external_links;
use crate::manifest::{
    DocumentedVisibility, ModuleManifest, PackageOptions, ParameterManifest, PluginConfiguration,
    SourceLink, SourceSetId, SourceSetManifest,
};
use folio_config::{ResolvedSourceSet, ResolvedUnit, Visibility};
use folio_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Version placeholder meaning "no version".
const UNSPECIFIED_VERSION: &str = "unspecified";

/// Which kind of output a generation run produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GenerationMode {
    /// Intermediate per-module output; template substitution is deferred.
    Module,
    /// Final browsable output; templates are substituted immediately.
    Publication,
}

impl GenerationMode {
    /// Lowercase name used in step ids and directory names.
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::Module => "module",
            GenerationMode::Publication => "publication",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assembles the manifest for one `(unit, format, mode)` run.
///
/// The builder only reads plain values; [`ManifestBuilder::build`] does no
/// I/O, so the same inputs always produce the same manifest.
pub struct ManifestBuilder<'a> {
    unit: &'a ResolvedUnit,
    mode: GenerationMode,
    output_dir: PathBuf,
    plugins_classpath: Vec<PathBuf>,
    modules: Vec<ModuleManifest>,
    sink: Option<&'a DiagnosticSink>,
}

impl<'a> ManifestBuilder<'a> {
    /// Starts a manifest for `unit` written to `output_dir`.
    pub fn new(unit: &'a ResolvedUnit, mode: GenerationMode, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            unit,
            mode,
            output_dir: output_dir.into(),
            plugins_classpath: Vec::new(),
            modules: Vec::new(),
            sink: None,
        }
    }

    /// Sets the resolved plugins classpath.
    pub fn plugins_classpath(mut self, files: Vec<PathBuf>) -> Self {
        self.plugins_classpath = files;
        self
    }

    /// Sets the modules an aggregation run combines.
    pub fn modules(mut self, modules: Vec<ModuleManifest>) -> Self {
        self.modules = modules;
        self
    }

    /// Reports notes (e.g. suppressed source sets) into `sink`.
    pub fn diagnostics(mut self, sink: &'a DiagnosticSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the manifest.
    pub fn build(&self) -> Result<ParameterManifest, ParamsError> {
        let unit = self.unit;
        if unit.module_name.is_empty() {
            return Err(ParamsError::MissingField {
                unit: unit.id.clone(),
                field: "moduleName".to_string(),
            });
        }

        let plugins_configuration = plugin_configurations(unit)?;
        let source_sets = self.source_sets()?;

        let mut modules = self.modules.clone();
        modules.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.module_path.cmp(&b.module_path))
        });

        debug!(
            unit = %unit.id,
            mode = %self.mode,
            source_sets = source_sets.len(),
            modules = modules.len(),
            "built parameter manifest"
        );

        Ok(ParameterManifest {
            module_name: unit.module_name.clone(),
            module_version: normalize_version(unit.module_version.as_deref()),
            output_dir: self.output_dir.clone(),
            cache_root: unit.cache_root.clone(),
            offline_mode: unit.publication.offline,
            fail_on_warning: unit.publication.fail_on_warning,
            suppress_obvious_functions: unit.publication.suppress_obvious_functions,
            suppress_inherited_members: unit.publication.suppress_inherited_members,
            delay_template_substitution: self.mode == GenerationMode::Module,
            source_sets,
            modules,
            includes: unit.includes.clone(),
            plugins_classpath: dedupe(&self.plugins_classpath),
            plugins_configuration,
        })
    }

    /// Non-suppressed source sets with validated, pruned dependency ids.
    fn source_sets(&self) -> Result<Vec<SourceSetManifest>, ParamsError> {
        let unit = self.unit;
        let scope = unit.id.as_str();
        let names: BTreeSet<&str> = unit.source_sets.iter().map(|s| s.name.as_str()).collect();

        let mut graph = DiGraphMap::<&str, ()>::new();
        for ss in &unit.source_sets {
            graph.add_node(ss.name.as_str());
            for reference in &ss.depends_on {
                let id = SourceSetId::parse_reference(reference, scope);
                if id.scope != scope {
                    continue;
                }
                let target = names.get(id.name.as_str()).copied().ok_or_else(|| {
                    ParamsError::UnknownSourceSet {
                        unit: unit.id.clone(),
                        source_set: ss.name.clone(),
                        reference: reference.clone(),
                    }
                })?;
                graph.add_edge(ss.name.as_str(), target, ());
            }
        }
        if let Err(cycle) = toposort(&graph, None) {
            return Err(ParamsError::DependencyCycle {
                unit: unit.id.clone(),
                source_set: cycle.node_id().to_string(),
            });
        }

        let suppressed: BTreeSet<&str> = unit
            .source_sets
            .iter()
            .filter(|s| s.suppress)
            .map(|s| s.name.as_str())
            .collect();
        for name in &suppressed {
            debug!(unit = %unit.id, source_set = *name, "excluding suppressed source set");
            if let Some(sink) = self.sink {
                sink.emit(
                    Diagnostic::note(
                        DiagnosticCode::SUPPRESSED_SOURCE_SET,
                        format!("source set '{name}' is suppressed and will not be documented"),
                    )
                    .in_unit(unit.id.clone()),
                );
            }
        }

        Ok(unit
            .source_sets
            .iter()
            .filter(|s| !s.suppress)
            .map(|s| source_set_manifest(scope, s, &suppressed))
            .collect())
    }
}

fn source_set_manifest(
    scope: &str,
    ss: &ResolvedSourceSet,
    suppressed: &BTreeSet<&str>,
) -> SourceSetManifest {
    let mut dependent_source_set_ids: Vec<SourceSetId> = Vec::new();
    for reference in &ss.depends_on {
        let id = SourceSetId::parse_reference(reference, scope);
        if id.scope == scope && suppressed.contains(id.name.as_str()) {
            continue;
        }
        if !dependent_source_set_ids.contains(&id) {
            dependent_source_set_ids.push(id);
        }
    }

    SourceSetManifest {
        source_set_id: SourceSetId::new(scope, ss.name.clone()),
        display_name: ss.display_name.clone(),
        dependent_source_set_ids,
        classpath: dedupe(&ss.classpath),
        source_roots: dedupe(&ss.source_roots),
        samples: dedupe(&ss.samples),
        includes: dedupe(&ss.includes),
        suppressed_files: dedupe(&ss.suppressed_files),
        documented_visibilities: visibilities(&ss.documented_visibilities),
        analysis_platform: ss.platform.into(),
        source_links: ss
            .source_links
            .iter()
            .map(|l| SourceLink {
                local_directory: l.local_directory.clone(),
                remote_url: l.remote_url.clone(),
                remote_line_suffix: l.remote_line_suffix.clone(),
            })
            .collect(),
        external_documentation_links: external_links(ss),
        per_package_options: ss
            .per_package
            .iter()
            .map(|p| PackageOptions {
                matching_regex: p.matching_regex.clone(),
                suppress: p.suppress,
                documented_visibilities: visibilities(
                    p.documented_visibilities
                        .as_deref()
                        .unwrap_or(&ss.documented_visibilities),
                ),
                report_undocumented: p.report_undocumented.unwrap_or(ss.report_undocumented),
                skip_deprecated: p.skip_deprecated.unwrap_or(ss.skip_deprecated),
            })
            .collect(),
        report_undocumented: ss.report_undocumented,
        skip_empty_packages: ss.skip_empty_packages,
        skip_deprecated: ss.skip_deprecated,
        jdk_version: ss.jdk_version,
        language_version: ss.language_version.clone(),
        api_version: ss.api_version.clone(),
    }
}

/// Encodes plugin blocks as JSON, rejecting repeated identifiers.
fn plugin_configurations(unit: &ResolvedUnit) -> Result<Vec<PluginConfiguration>, ParamsError> {
    let mut by_id = BTreeMap::new();
    for plugin in &unit.plugins {
        let values =
            serde_json::to_string(&plugin.values).map_err(|source| ParamsError::PluginValues {
                unit: unit.id.clone(),
                plugin_id: plugin.id.clone(),
                source,
            })?;
        if by_id.insert(plugin.id.clone(), values).is_some() {
            return Err(ParamsError::DuplicatePlugin {
                unit: unit.id.clone(),
                plugin_id: plugin.id.clone(),
            });
        }
    }
    Ok(by_id
        .into_iter()
        .map(|(plugin_id, values)| PluginConfiguration { plugin_id, values })
        .collect())
}

/// Maps the `"unspecified"` placeholder to no version.
pub fn normalize_version(version: Option<&str>) -> Option<String> {
    match version {
        None | Some(UNSPECIFIED_VERSION) => None,
        Some(v) => Some(v.to_string()),
    }
}

/// Deduplicated visibilities in canonical order.
fn visibilities(configured: &[Visibility]) -> Vec<DocumentedVisibility> {
    let set: BTreeSet<DocumentedVisibility> = configured.iter().map(|v| (*v).into()).collect();
    set.into_iter().collect()
}

fn dedupe(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for p in paths {
        if !out.contains(p) {
            out.push(p.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::to_json;
    use folio_config::load_workspace;
    use std::path::Path;

    fn resolve(unit_toml: &str) -> (tempfile::TempDir, ResolvedUnit) {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("folio.toml"), unit_toml).unwrap();
        let ws = load_workspace(tmp.path()).unwrap();
        let unit = ws.resolve_units().unwrap().remove(0);
        (tmp, unit)
    }

    fn build(unit: &ResolvedUnit) -> Result<ParameterManifest, ParamsError> {
        ManifestBuilder::new(unit, GenerationMode::Module, "/out").build()
    }

    #[test]
    fn suppressed_source_sets_are_excluded() {
        let (_tmp, unit) = resolve(
            r#"
[unit]
name = "lib"

[source_sets.a]
[source_sets.b]
suppress = true
"#,
        );
        let sink = DiagnosticSink::new();
        let manifest = ManifestBuilder::new(&unit, GenerationMode::Module, "/out")
            .diagnostics(&sink)
            .build()
            .unwrap();
        let ids: Vec<_> = manifest
            .source_sets
            .iter()
            .map(|s| s.source_set_id.name.as_str())
            .collect();
        assert_eq!(ids, vec!["a"]);
        let notes = sink.diagnostics();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].code, DiagnosticCode::SUPPRESSED_SOURCE_SET);
    }

    #[test]
    fn references_to_suppressed_source_sets_are_pruned() {
        let (_tmp, unit) = resolve(
            r#"
[unit]
[source_sets.common]
suppress = true
[source_sets.jvm]
depends_on = ["common", "other/shared"]
"#,
        );
        let manifest = build(&unit).unwrap();
        assert_eq!(manifest.source_sets.len(), 1);
        assert_eq!(
            manifest.source_sets[0].dependent_source_set_ids,
            vec![SourceSetId::new("other", "shared")]
        );
    }

    #[test]
    fn unspecified_version_is_absent() {
        let (_tmp, unit) = resolve("[unit]\nversion = \"unspecified\"\n");
        let manifest = build(&unit).unwrap();
        assert_eq!(manifest.module_version, None);
        let json = String::from_utf8(to_json(&manifest).unwrap()).unwrap();
        assert!(json.contains("\"moduleVersion\": null"));
        assert!(!json.contains("\"unspecified\""));
    }

    #[test]
    fn real_version_is_kept() {
        assert_eq!(normalize_version(Some("1.2.0")).as_deref(), Some("1.2.0"));
        assert_eq!(normalize_version(None), None);
    }

    #[test]
    fn duplicate_plugin_is_rejected() {
        let (_tmp, unit) = resolve(
            r#"
[unit]
name = "lib"

[[plugin]]
id = "org.jetbrains.dokka.base.DokkaBase"
values = { footerMessage = "a" }

[[plugin]]
id = "org.jetbrains.dokka.base.DokkaBase"
values = { footerMessage = "b" }
"#,
        );
        let err = build(&unit).unwrap_err();
        assert!(matches!(
            err,
            ParamsError::DuplicatePlugin { ref plugin_id, .. } if plugin_id == "org.jetbrains.dokka.base.DokkaBase"
        ));
        assert!(err.to_string().contains("build unit '.'"));
    }

    #[test]
    fn plugin_values_are_sorted_json() {
        let (_tmp, unit) = resolve(
            r#"
[unit]
[[plugin]]
id = "z.Plugin"
values = { b = 2, a = "x" }

[[plugin]]
id = "a.Plugin"
"#,
        );
        let manifest = build(&unit).unwrap();
        let ids: Vec<_> = manifest
            .plugins_configuration
            .iter()
            .map(|p| p.plugin_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a.Plugin", "z.Plugin"]);
        assert_eq!(manifest.plugins_configuration[0].values, "{}");
        assert_eq!(manifest.plugins_configuration[1].values, "{\"a\":\"x\",\"b\":2}");
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let (_tmp, unit) = resolve("[unit]\n[source_sets.jvm]\ndepends_on = [\"nope\"]\n");
        let err = build(&unit).unwrap_err();
        assert!(matches!(err, ParamsError::UnknownSourceSet { ref reference, .. } if reference == "nope"));
    }

    #[test]
    fn dependency_cycle_is_rejected() {
        let (_tmp, unit) = resolve(
            r#"
[unit]
[source_sets.a]
depends_on = ["b"]
[source_sets.b]
depends_on = ["a"]
"#,
        );
        assert!(matches!(
            build(&unit).unwrap_err(),
            ParamsError::DependencyCycle { .. }
        ));
    }

    #[test]
    fn modes_set_template_flag() {
        let (_tmp, unit) = resolve("[unit]\n");
        let module = build(&unit).unwrap();
        assert!(module.delay_template_substitution);
        let publication = ManifestBuilder::new(&unit, GenerationMode::Publication, "/out")
            .build()
            .unwrap();
        assert!(!publication.delay_template_substitution);
    }

    #[test]
    fn default_links_follow_flags() {
        let (_tmp, unit) = resolve(
            r#"
[unit]
[source_sets.jvm]
jdk_version = 17
enable_android_link = true
[[source_sets.jvm.external_links]]
url = "https://kotlinlang.org/api/kotlinx.coroutines"
[[source_sets.jvm.external_links]]
url = "https://off.example.com/"
enabled = false
[source_sets.js]
platform = "js"
enable_kotlin_stdlib_link = false
"#,
        );
        let manifest = build(&unit).unwrap();
        let js = &manifest.source_sets[0];
        assert_eq!(js.source_set_id.name, "js");
        assert!(js.external_documentation_links.is_empty());

        let jvm = &manifest.source_sets[1];
        let urls: Vec<_> = jvm
            .external_documentation_links
            .iter()
            .map(|l| l.url.as_str())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://kotlinlang.org/api/kotlinx.coroutines/",
                "https://kotlinlang.org/api/core/",
                "https://docs.oracle.com/en/java/javase/17/docs/api/",
                "https://developer.android.com/reference/kotlin/",
            ]
        );
    }

    #[test]
    fn per_package_inherits_source_set_values() {
        let (_tmp, unit) = resolve(
            r#"
[unit]
[source_sets.main]
documented_visibilities = ["protected", "public"]
report_undocumented = true
[[source_sets.main.per_package]]
matching_regex = ".*internal.*"
suppress = true
[[source_sets.main.per_package]]
matching_regex = ".*api.*"
documented_visibilities = ["public"]
report_undocumented = false
"#,
        );
        let manifest = build(&unit).unwrap();
        let options = &manifest.source_sets[0].per_package_options;
        assert_eq!(
            options[0].documented_visibilities,
            vec![DocumentedVisibility::Public, DocumentedVisibility::Protected]
        );
        assert!(options[0].report_undocumented);
        assert_eq!(
            options[1].documented_visibilities,
            vec![DocumentedVisibility::Public]
        );
        assert!(!options[1].report_undocumented);
    }

    #[test]
    fn classpath_is_deduplicated_in_order() {
        let (_tmp, unit) = resolve("[unit]\n");
        let manifest = ManifestBuilder::new(&unit, GenerationMode::Module, "/out")
            .plugins_classpath(vec![
                PathBuf::from("/e/b.jar"),
                PathBuf::from("/e/a.jar"),
                PathBuf::from("/e/b.jar"),
            ])
            .build()
            .unwrap();
        assert_eq!(
            manifest.plugins_classpath,
            vec![PathBuf::from("/e/b.jar"), PathBuf::from("/e/a.jar")]
        );
        assert_eq!(manifest.output_dir, Path::new("/out"));
    }

    #[test]
    fn modules_are_sorted_by_name() {
        let (_tmp, unit) = resolve("[unit]\nname = \"docs\"\n");
        let module = |name: &str| ModuleManifest {
            name: name.to_string(),
            module_path: name.to_string(),
            source_output_directory: PathBuf::from(format!("/w/{name}")),
            includes: Vec::new(),
        };
        let manifest = ManifestBuilder::new(&unit, GenerationMode::Publication, "/out")
            .modules(vec![module("hello"), module("goodbye")])
            .build()
            .unwrap();
        let names: Vec<_> = manifest.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["goodbye", "hello"]);
    }
}

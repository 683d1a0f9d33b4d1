//! Unit resolution: merging workspace defaults into build-unit configuration.

use crate::error::ConfigError;
use crate::loader::{UnitSource, Workspace};
use crate::types::{
    EngineConfig, ExternalLinkConfig, PerPackageConfig, Platform, PluginConfig, PublicationConfig,
    SourceSetConfig, Visibility,
};
use folio_attrs::Format;
use folio_common::RelPath;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Unit id of a workspace root that is itself a build unit.
pub const ROOT_UNIT: &str = ".";

/// A fully resolved build unit with absolute paths and workspace defaults merged.
#[derive(Debug, Clone)]
pub struct ResolvedUnit {
    /// Workspace-relative unit id.
    pub id: String,
    /// Absolute unit directory.
    pub dir: PathBuf,
    /// Module name.
    pub module_name: String,
    /// Module version exactly as configured.
    pub module_version: Option<String>,
    /// Path of this module's output inside an aggregate.
    pub module_path: RelPath,
    /// Output formats in configuration order.
    pub formats: Vec<Format>,
    /// Module-level include files.
    pub includes: Vec<PathBuf>,
    /// Plugin jars offered to consumers of every format.
    pub provides_plugins: Vec<PathBuf>,
    /// Publication flags with `cache_root` made absolute.
    pub publication: PublicationConfig,
    /// Absolute engine cache directory.
    pub cache_root: Option<PathBuf>,
    /// Source sets in name order.
    pub source_sets: Vec<ResolvedSourceSet>,
    /// Plugin configuration blocks in declaration order.
    pub plugins: Vec<PluginConfig>,
    /// Unit ids whose modules this unit aggregates.
    pub module_dependencies: Vec<String>,
    /// Engine launch settings.
    pub engine: ResolvedEngine,
    /// Engine plugin jars per format (workspace entries first).
    pub format_plugins: BTreeMap<Format, Vec<PathBuf>>,
}

/// Engine launch settings with absolute classpath entries.
///
/// Serializes to the stable form hashed into generation cache keys.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEngine {
    /// JVM launcher program.
    pub java: String,
    /// Engine entry point class.
    pub main_class: String,
    /// Absolute engine jars.
    pub classpath: Vec<PathBuf>,
    /// `-Xms` value.
    pub min_heap: Option<String>,
    /// `-Xmx` value.
    pub max_heap: Option<String>,
    /// Extra JVM arguments.
    pub jvm_args: Vec<String>,
    /// `-D` system properties.
    pub system_properties: BTreeMap<String, String>,
    /// Launcher override; empty for the JVM command line.
    pub program: Vec<String>,
}

/// A source set with absolute paths.
#[derive(Debug, Clone)]
pub struct ResolvedSourceSet {
    /// Source-set name, unique within the unit.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Target platform.
    pub platform: Platform,
    /// Absolute source roots.
    pub source_roots: Vec<PathBuf>,
    /// Absolute classpath entries.
    pub classpath: Vec<PathBuf>,
    /// Absolute sample paths.
    pub samples: Vec<PathBuf>,
    /// Absolute include files.
    pub includes: Vec<PathBuf>,
    /// Absolute suppressed files.
    pub suppressed_files: Vec<PathBuf>,
    /// Raw dependency references (`name` or `scope/name`).
    pub depends_on: Vec<String>,
    /// Excluded from generation.
    pub suppress: bool,
    /// Visibilities to document.
    pub documented_visibilities: Vec<Visibility>,
    /// Report undocumented declarations.
    pub report_undocumented: bool,
    /// Skip empty packages.
    pub skip_empty_packages: bool,
    /// Skip deprecated declarations.
    pub skip_deprecated: bool,
    /// JDK version for JDK links.
    pub jdk_version: u32,
    /// Language version.
    pub language_version: Option<String>,
    /// API version.
    pub api_version: Option<String>,
    /// Link the JDK documentation.
    pub enable_jdk_link: bool,
    /// Link the Kotlin standard library documentation.
    pub enable_kotlin_stdlib_link: bool,
    /// Link the Android documentation.
    pub enable_android_link: bool,
    /// Source links with absolute local directories.
    pub source_links: Vec<ResolvedSourceLink>,
    /// External documentation links as configured.
    pub external_links: Vec<ExternalLinkConfig>,
    /// Per-package overrides.
    pub per_package: Vec<PerPackageConfig>,
}

/// A source link with an absolute local directory.
#[derive(Debug, Clone)]
pub struct ResolvedSourceLink {
    /// Absolute local directory.
    pub local_directory: PathBuf,
    /// Hosted URL.
    pub remote_url: String,
    /// Line-number suffix.
    pub remote_line_suffix: Option<String>,
}

impl Workspace {
    /// Resolves every unit and checks that module dependencies name members.
    pub fn resolve_units(&self) -> Result<Vec<ResolvedUnit>, ConfigError> {
        let resolved = self
            .units
            .iter()
            .map(|u| resolve_unit(self, u))
            .collect::<Result<Vec<_>, _>>()?;
        for unit in &resolved {
            for dep in &unit.module_dependencies {
                if self.unit(dep).is_none() {
                    return Err(ConfigError::invalid(
                        &unit.id,
                        "dependencies.modules",
                        format!("'{dep}' is not a workspace member"),
                    ));
                }
                if dep == &unit.id {
                    return Err(ConfigError::invalid(
                        &unit.id,
                        "dependencies.modules",
                        "a unit cannot depend on itself",
                    ));
                }
            }
        }
        Ok(resolved)
    }
}

/// Resolves one unit against its workspace.
///
/// Engine settings come from the unit when it declares `[engine]`, otherwise
/// from the workspace root. Format plugins are the union of both levels.
pub fn resolve_unit(workspace: &Workspace, source: &UnitSource) -> Result<ResolvedUnit, ConfigError> {
    let config = &source.config;
    let dir = &source.dir;
    let meta = config.unit.clone().unwrap_or_default();

    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    let module_name = meta.name.clone().unwrap_or(dir_name);

    let module_path = match (&meta.path, source.id.as_str()) {
        (Some(p), _) => RelPath::new(p),
        (None, ROOT_UNIT) => RelPath::new(&module_name),
        (None, id) => RelPath::new(id),
    }
    .map_err(|e| ConfigError::invalid(&source.id, "unit.path", e.to_string()))?;

    let formats = if meta.formats.is_empty() {
        vec![Format::html()]
    } else {
        meta.formats
            .iter()
            .map(|f| Format::new(f))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::invalid(&source.id, "unit.formats", e.to_string()))?
    };

    let (engine, engine_base) = match (&config.engine, &workspace.config.engine) {
        (Some(own), _) => (own.clone(), dir.as_path()),
        (None, Some(shared)) => (shared.clone(), workspace.root.as_path()),
        (None, None) => (EngineConfig::default(), workspace.root.as_path()),
    };

    let mut format_plugins = BTreeMap::new();
    for format in &formats {
        let mut jars = Vec::new();
        if let Some(shared) = workspace.config.formats.get(format.name()) {
            jars.extend(absolute_all(&workspace.root, &shared.plugins));
        }
        if source.id != ROOT_UNIT {
            if let Some(own) = config.formats.get(format.name()) {
                jars.extend(absolute_all(dir, &own.plugins));
            }
        }
        format_plugins.insert(format.clone(), jars);
    }

    let mut module_dependencies = Vec::new();
    for dep in &config.dependencies.modules {
        let target = normalize(&dir.join(dep));
        let id = unit_id(&workspace.root, &target).ok_or_else(|| {
            ConfigError::invalid(
                &source.id,
                "dependencies.modules",
                format!("'{dep}' is outside the workspace"),
            )
        })?;
        if !module_dependencies.contains(&id) {
            module_dependencies.push(id);
        }
    }

    let cache_root = config
        .publication
        .cache_root
        .as_ref()
        .map(|p| absolute(dir, p));

    Ok(ResolvedUnit {
        id: source.id.clone(),
        dir: dir.clone(),
        module_name,
        module_version: meta.version.clone(),
        module_path,
        formats,
        includes: absolute_all(dir, &meta.includes),
        provides_plugins: absolute_all(dir, &meta.provides_plugins),
        publication: config.publication.clone(),
        cache_root,
        source_sets: config
            .source_sets
            .iter()
            .map(|(name, ss)| resolve_source_set(dir, name, ss))
            .collect(),
        plugins: config.plugins.clone(),
        module_dependencies,
        engine: ResolvedEngine {
            java: engine.java,
            main_class: engine.main_class,
            classpath: absolute_all(engine_base, &engine.classpath),
            min_heap: engine.min_heap,
            max_heap: engine.max_heap,
            jvm_args: engine.jvm_args,
            system_properties: engine.system_properties,
            program: engine.program,
        },
        format_plugins,
    })
}

fn resolve_source_set(dir: &Path, name: &str, ss: &SourceSetConfig) -> ResolvedSourceSet {
    ResolvedSourceSet {
        name: name.to_string(),
        display_name: ss.display_name.clone().unwrap_or_else(|| name.to_string()),
        platform: ss.platform,
        source_roots: absolute_all(dir, &ss.source_roots),
        classpath: absolute_all(dir, &ss.classpath),
        samples: absolute_all(dir, &ss.samples),
        includes: absolute_all(dir, &ss.includes),
        suppressed_files: absolute_all(dir, &ss.suppressed_files),
        depends_on: ss.depends_on.clone(),
        suppress: ss.suppress,
        documented_visibilities: ss.documented_visibilities.clone(),
        report_undocumented: ss.report_undocumented,
        skip_empty_packages: ss.skip_empty_packages,
        skip_deprecated: ss.skip_deprecated,
        jdk_version: ss.jdk_version,
        language_version: ss.language_version.clone(),
        api_version: ss.api_version.clone(),
        enable_jdk_link: ss.enable_jdk_link,
        enable_kotlin_stdlib_link: ss.enable_kotlin_stdlib_link,
        enable_android_link: ss.enable_android_link,
        source_links: ss
            .source_links
            .iter()
            .map(|l| ResolvedSourceLink {
                local_directory: absolute(dir, &l.local_directory),
                remote_url: l.remote_url.clone(),
                remote_line_suffix: l.remote_line_suffix.clone(),
            })
            .collect(),
        external_links: ss.external_links.clone(),
        per_package: ss.per_package.clone(),
    }
}

fn absolute(base: &Path, path: &str) -> PathBuf {
    normalize(&base.join(path))
}

fn absolute_all(base: &Path, paths: &[String]) -> Vec<PathBuf> {
    paths.iter().map(|p| absolute(base, p)).collect()
}

/// Lexically removes `.` and `..` segments without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The workspace-relative id of `dir`, or `None` when it lies outside `root`.
fn unit_id(root: &Path, dir: &Path) -> Option<String> {
    if dir == root {
        return Some(ROOT_UNIT.to_string());
    }
    RelPath::from_base(root, dir).map(|p| p.as_str().to_string())
}

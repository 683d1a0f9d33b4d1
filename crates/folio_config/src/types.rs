//! Configuration types deserialized from `folio.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One parsed `folio.toml`.
///
/// A workspace root carries `[workspace]`, `[engine]` and `[formats.*]`; a
/// build unit carries `[unit]` and the tables below it. A root may be both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolioConfig {
    /// Workspace membership, present only at the root.
    #[serde(default)]
    pub workspace: Option<WorkspaceConfig>,
    /// Generation engine launch settings.
    #[serde(default)]
    pub engine: Option<EngineConfig>,
    /// Per-format plugin settings keyed by format name.
    #[serde(default)]
    pub formats: BTreeMap<String, FormatConfig>,
    /// Build-unit metadata. Its presence makes the directory a build unit.
    #[serde(default)]
    pub unit: Option<UnitMeta>,
    /// Publication-wide generation flags.
    #[serde(default)]
    pub publication: PublicationConfig,
    /// Source sets keyed by name.
    #[serde(default)]
    pub source_sets: BTreeMap<String, SourceSetConfig>,
    /// Plugin configuration blocks in declaration order.
    #[serde(default, rename = "plugin")]
    pub plugins: Vec<PluginConfig>,
    /// Other build units this unit consumes.
    #[serde(default)]
    pub dependencies: DependenciesConfig,
}

/// The `[workspace]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Member unit directories, relative to the workspace root.
    #[serde(default)]
    pub members: Vec<String>,
    /// Upper bound on concurrently running steps.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_jobs() -> usize {
    2
}

/// The `[engine]` table: how to launch the generation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// JVM launcher program.
    #[serde(default = "default_java")]
    pub java: String,
    /// Engine entry point class.
    #[serde(default = "default_main_class")]
    pub main_class: String,
    /// Engine jars, relative to the workspace root.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub classpath: Vec<String>,
    /// Initial heap size (`-Xms`), e.g. `"512m"`.
    #[serde(default)]
    pub min_heap: Option<String>,
    /// Maximum heap size (`-Xmx`), e.g. `"2g"`.
    #[serde(default)]
    pub max_heap: Option<String>,
    /// Extra JVM arguments placed before the main class.
    #[serde(default)]
    pub jvm_args: Vec<String>,
    /// `-D` system properties.
    #[serde(default)]
    pub system_properties: BTreeMap<String, String>,
    /// Replaces the whole JVM command line when non-empty.
    ///
    /// The manifest path is appended as the last argument.
    #[serde(default)]
    pub program: Vec<String>,
}

fn default_java() -> String {
    "java".to_string()
}

fn default_main_class() -> String {
    "org.jetbrains.dokka.MainKt".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            main_class: default_main_class(),
            classpath: Vec::new(),
            min_heap: None,
            max_heap: None,
            jvm_args: Vec::new(),
            system_properties: BTreeMap::new(),
            program: Vec::new(),
        }
    }
}

/// A `[formats.<name>]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatConfig {
    /// Engine plugin jars for this format, relative to the workspace root.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub plugins: Vec<String>,
}

/// The `[unit]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitMeta {
    /// Module name. Defaults to the unit directory name.
    #[serde(default)]
    pub name: Option<String>,
    /// Module version. `"unspecified"` means no version.
    #[serde(default)]
    pub version: Option<String>,
    /// Path of this module's output inside an aggregate.
    #[serde(default)]
    pub path: Option<String>,
    /// Output formats. Defaults to `["html"]`.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub formats: Vec<String>,
    /// Module-level documentation files (e.g. `Module.md`).
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub includes: Vec<String>,
    /// Engine plugin jars this unit offers to every format of its consumers.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub provides_plugins: Vec<String>,
}

/// The `[publication]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicationConfig {
    /// Do not fetch remote package lists.
    #[serde(default)]
    pub offline: bool,
    /// Treat engine warnings as failures.
    #[serde(default)]
    pub fail_on_warning: bool,
    /// Hide functions every type has (`equals`, `hashCode`, ...).
    #[serde(default = "default_true")]
    pub suppress_obvious_functions: bool,
    /// Hide members inherited from other types.
    #[serde(default)]
    pub suppress_inherited_members: bool,
    /// Engine cache directory, relative to the unit.
    #[serde(default)]
    pub cache_root: Option<String>,
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            offline: false,
            fail_on_warning: false,
            suppress_obvious_functions: true,
            suppress_inherited_members: false,
            cache_root: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_jdk_version() -> u32 {
    8
}

/// Target platform of a source set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// JVM bytecode.
    #[default]
    Jvm,
    /// JavaScript.
    Js,
    /// WebAssembly.
    Wasm,
    /// Native binaries.
    Native,
    /// Platform-independent common code.
    Common,
}

/// Declaration visibility that may be documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Public declarations.
    Public,
    /// Protected declarations.
    Protected,
    /// Module-internal declarations.
    Internal,
    /// Private declarations.
    Private,
    /// Java package-private declarations.
    Package,
}

fn default_visibilities() -> Vec<Visibility> {
    vec![Visibility::Public]
}

/// A `[source_sets.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSetConfig {
    /// Name shown in the generated output. Defaults to the source-set name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Target platform.
    #[serde(default)]
    pub platform: Platform,
    /// Directories containing sources.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub source_roots: Vec<String>,
    /// Compiled classpath entries.
    #[serde(default)]
    pub classpath: Vec<String>,
    /// Sample source files or directories.
    #[serde(default)]
    pub samples: Vec<String>,
    /// Documentation include files.
    #[serde(default)]
    pub includes: Vec<String>,
    /// Files excluded from documentation.
    #[serde(default)]
    pub suppressed_files: Vec<String>,
    /// Source sets this one depends on: a name in this unit or `scope/name`.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Exclude this source set from generation entirely.
    #[serde(default)]
    pub suppress: bool,
    /// Visibilities to document.
    #[serde(default = "default_visibilities")]
    pub documented_visibilities: Vec<Visibility>,
    /// Report undocumented declarations.
    #[serde(default)]
    pub report_undocumented: bool,
    /// Skip packages with no documentable declarations.
    #[serde(default = "default_true")]
    pub skip_empty_packages: bool,
    /// Skip deprecated declarations.
    #[serde(default)]
    pub skip_deprecated: bool,
    /// JDK version used to link JDK types.
    #[serde(default = "default_jdk_version")]
    pub jdk_version: u32,
    /// Language version for analysis.
    #[serde(default)]
    pub language_version: Option<String>,
    /// API version for analysis.
    #[serde(default)]
    pub api_version: Option<String>,
    /// Link to the JDK API documentation.
    #[serde(default = "default_true")]
    pub enable_jdk_link: bool,
    /// Link to the Kotlin standard library documentation.
    #[serde(default = "default_true")]
    pub enable_kotlin_stdlib_link: bool,
    /// Link to the Android API documentation.
    #[serde(default)]
    pub enable_android_link: bool,
    /// Links from documentation to hosted source code.
    #[serde(default)]
    pub source_links: Vec<SourceLinkConfig>,
    /// External documentation to link against.
    #[serde(default)]
    pub external_links: Vec<ExternalLinkConfig>,
    /// Per-package overrides.
    #[serde(default)]
    pub per_package: Vec<PerPackageConfig>,
}

/// A `[[source_sets.<name>.source_links]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceLinkConfig {
    /// Local source directory, relative to the unit.
    pub local_directory: String,
    /// URL the directory is hosted at.
    pub remote_url: String,
    /// Suffix appended before a line number, e.g. `#L`.
    #[serde(default)]
    pub remote_line_suffix: Option<String>,
}

/// A `[[source_sets.<name>.external_links]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalLinkConfig {
    /// Root URL of the external documentation.
    pub url: String,
    /// Package-list URL. Defaults to `<url>package-list`.
    #[serde(default)]
    pub package_list_url: Option<String>,
    /// Disabled links are dropped.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A `[[source_sets.<name>.per_package]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PerPackageConfig {
    /// Regex matched against fully qualified package names.
    pub matching_regex: String,
    /// Suppress matching packages.
    #[serde(default)]
    pub suppress: bool,
    /// Overrides the source set's documented visibilities.
    #[serde(default)]
    pub documented_visibilities: Option<Vec<Visibility>>,
    /// Overrides the source set's undocumented reporting.
    #[serde(default)]
    pub report_undocumented: Option<bool>,
    /// Overrides the source set's deprecated skipping.
    #[serde(default)]
    pub skip_deprecated: Option<bool>,
}

/// A `[[plugin]]` configuration block.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    /// Fully qualified plugin identifier.
    pub id: String,
    /// Plugin-specific values, passed to the engine as a JSON object.
    #[serde(default)]
    pub values: toml::Table,
}

/// The `[dependencies]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependenciesConfig {
    /// Unit directories, relative to this unit, whose modules this unit aggregates.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub modules: Vec<String>,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `formats = "html"` as well as `formats = ["html", "gfm"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

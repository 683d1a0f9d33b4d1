//! Wire types of the parameter manifest and the module descriptor.
//!
//! Field names are camelCase on the wire. Optional values serialize as
//! `null` rather than being omitted, so every manifest has the same shape.

use crate::error::ParamsError;
use folio_common::ContentHash;
use folio_config::{Platform, Visibility};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The complete input of one generation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterManifest {
    /// Module (or publication) name.
    pub module_name: String,
    /// Module version; absent when unset or `"unspecified"`.
    pub module_version: Option<String>,
    /// Where the engine writes its output.
    pub output_dir: PathBuf,
    /// Engine cache directory.
    pub cache_root: Option<PathBuf>,
    /// Do not fetch remote resources.
    pub offline_mode: bool,
    /// Fail the run on engine warnings.
    pub fail_on_warning: bool,
    /// Hide obvious functions.
    pub suppress_obvious_functions: bool,
    /// Hide inherited members.
    pub suppress_inherited_members: bool,
    /// Defer template substitution to a later aggregation run.
    pub delay_template_substitution: bool,
    /// Non-suppressed source sets.
    pub source_sets: Vec<SourceSetManifest>,
    /// Modules to aggregate, sorted by name.
    pub modules: Vec<ModuleManifest>,
    /// Publication-level include files.
    pub includes: Vec<PathBuf>,
    /// Engine plugin jars.
    pub plugins_classpath: Vec<PathBuf>,
    /// Plugin configuration blocks, sorted by plugin id.
    pub plugins_configuration: Vec<PluginConfiguration>,
}

/// Identifies a source set across build units.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceSetId {
    /// The owning build unit.
    pub scope: String,
    /// The source-set name within the unit.
    pub name: String,
}

impl SourceSetId {
    /// Creates an id.
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }

    /// Parses a `depends_on` reference: `name` in `scope`, or `scope/name`.
    pub fn parse_reference(reference: &str, scope: &str) -> Self {
        match reference.rsplit_once('/') {
            Some((s, n)) => Self::new(s, n),
            None => Self::new(scope, reference),
        }
    }

    /// `scope/name`, as used for attribute tags and channel names.
    pub fn qualified(&self) -> String {
        format!("{}/{}", self.scope, self.name)
    }
}

/// One source set as seen by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSetManifest {
    /// Unique id.
    pub source_set_id: SourceSetId,
    /// Name shown in the output.
    pub display_name: String,
    /// Source sets this one depends on.
    pub dependent_source_set_ids: Vec<SourceSetId>,
    /// Compiled classpath.
    pub classpath: Vec<PathBuf>,
    /// Source roots.
    pub source_roots: Vec<PathBuf>,
    /// Sample files.
    pub samples: Vec<PathBuf>,
    /// Include files.
    pub includes: Vec<PathBuf>,
    /// Suppressed files.
    pub suppressed_files: Vec<PathBuf>,
    /// Visibilities to document.
    pub documented_visibilities: Vec<DocumentedVisibility>,
    /// Target platform.
    pub analysis_platform: AnalysisPlatform,
    /// Links to hosted sources.
    pub source_links: Vec<SourceLink>,
    /// External documentation links.
    pub external_documentation_links: Vec<ExternalLink>,
    /// Per-package overrides.
    pub per_package_options: Vec<PackageOptions>,
    /// Report undocumented declarations.
    pub report_undocumented: bool,
    /// Skip empty packages.
    pub skip_empty_packages: bool,
    /// Skip deprecated declarations.
    pub skip_deprecated: bool,
    /// JDK version.
    pub jdk_version: u32,
    /// Language version.
    pub language_version: Option<String>,
    /// API version.
    pub api_version: Option<String>,
}

/// Engine spelling of a documented visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentedVisibility {
    /// Public.
    Public,
    /// Protected.
    Protected,
    /// Internal.
    Internal,
    /// Private.
    Private,
    /// Package-private.
    Package,
}

impl From<Visibility> for DocumentedVisibility {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::Public => DocumentedVisibility::Public,
            Visibility::Protected => DocumentedVisibility::Protected,
            Visibility::Internal => DocumentedVisibility::Internal,
            Visibility::Private => DocumentedVisibility::Private,
            Visibility::Package => DocumentedVisibility::Package,
        }
    }
}

/// Engine spelling of an analysis platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPlatform {
    /// JVM.
    Jvm,
    /// JavaScript.
    Js,
    /// WebAssembly.
    Wasm,
    /// Native.
    Native,
    /// Common.
    Common,
}

impl From<Platform> for AnalysisPlatform {
    fn from(p: Platform) -> Self {
        match p {
            Platform::Jvm => AnalysisPlatform::Jvm,
            Platform::Js => AnalysisPlatform::Js,
            Platform::Wasm => AnalysisPlatform::Wasm,
            Platform::Native => AnalysisPlatform::Native,
            Platform::Common => AnalysisPlatform::Common,
        }
    }
}

/// A link from a local source directory to its hosted copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLink {
    /// Local directory.
    pub local_directory: PathBuf,
    /// Hosted URL.
    pub remote_url: String,
    /// Line-number suffix.
    pub remote_line_suffix: Option<String>,
}

/// External documentation the output links to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLink {
    /// Documentation root, ending in `/`.
    pub url: String,
    /// Package-list (or element-list) location.
    pub package_list_url: String,
}

/// Overrides applied to packages matching a regex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageOptions {
    /// Package-name regex.
    pub matching_regex: String,
    /// Suppress matching packages.
    pub suppress: bool,
    /// Visibilities to document.
    pub documented_visibilities: Vec<DocumentedVisibility>,
    /// Report undocumented declarations.
    pub report_undocumented: bool,
    /// Skip deprecated declarations.
    pub skip_deprecated: bool,
}

/// A module fed into an aggregation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleManifest {
    /// Module name.
    pub name: String,
    /// Where the module's output is nested inside the aggregate.
    pub module_path: String,
    /// The module's generated output directory.
    pub source_output_directory: PathBuf,
    /// The module's include files.
    pub includes: Vec<PathBuf>,
}

/// The minimal module identity exchanged between build units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    /// Module name.
    pub name: String,
    /// Nesting path inside an aggregate.
    pub module_path: String,
}

/// One plugin's configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfiguration {
    /// Fully qualified plugin identifier.
    pub plugin_id: String,
    /// The plugin's values as a JSON object string.
    pub values: String,
}

/// Serializes a manifest. The output ends with a newline.
pub fn to_json(manifest: &ParameterManifest) -> Result<Vec<u8>, ParamsError> {
    let mut bytes = serde_json::to_vec_pretty(manifest)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Hash of serialized manifest bytes, the primary cache key of a generation step.
pub fn manifest_hash(bytes: &[u8]) -> ContentHash {
    ContentHash::from_bytes(bytes)
}

/// Writes a manifest to `path`, creating parent directories.
pub fn write_manifest(manifest: &ParameterManifest, path: &Path) -> Result<Vec<u8>, ParamsError> {
    let bytes = to_json(manifest)?;
    let io = |source| ParamsError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io)?;
    }
    std::fs::write(path, &bytes).map_err(io)?;
    Ok(bytes)
}

/// Reads a manifest back verbatim.
pub fn read_manifest(path: &Path) -> Result<ParameterManifest, ParamsError> {
    let bytes = std::fs::read(path).map_err(|source| ParamsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterManifest {
        ParameterManifest {
            module_name: "hello".to_string(),
            module_version: None,
            output_dir: PathBuf::from("/w/hello/build/folio/html/module"),
            cache_root: None,
            offline_mode: false,
            fail_on_warning: false,
            suppress_obvious_functions: true,
            suppress_inherited_members: false,
            delay_template_substitution: true,
            source_sets: Vec::new(),
            modules: Vec::new(),
            includes: Vec::new(),
            plugins_classpath: vec![PathBuf::from("/e/base.jar")],
            plugins_configuration: vec![PluginConfiguration {
                plugin_id: "org.jetbrains.dokka.base.DokkaBase".to_string(),
                values: "{\"footerMessage\":\"x\"}".to_string(),
            }],
        }
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = String::from_utf8(to_json(&sample()).unwrap()).unwrap();
        assert!(json.contains("\"moduleName\": \"hello\""));
        assert!(json.contains("\"moduleVersion\": null"));
        assert!(json.contains("\"delayTemplateSubstitution\": true"));
        assert!(json.contains("\"pluginsConfiguration\""));
        assert!(json.contains("\"pluginId\""));
        assert!(json.ends_with("}\n"));
    }

    #[test]
    fn enum_spellings() {
        assert_eq!(
            serde_json::to_string(&DocumentedVisibility::Public).unwrap(),
            "\"PUBLIC\""
        );
        assert_eq!(
            serde_json::to_string(&AnalysisPlatform::from(Platform::Common)).unwrap(),
            "\"common\""
        );
    }

    #[test]
    fn write_then_read_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("work/manifest.json");
        let written = write_manifest(&sample(), &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), written);
        assert_eq!(read_manifest(&path).unwrap(), sample());
    }

    #[test]
    fn hash_tracks_bytes() {
        let a = to_json(&sample()).unwrap();
        let mut other = sample();
        other.offline_mode = true;
        let b = to_json(&other).unwrap();
        assert_eq!(manifest_hash(&a), manifest_hash(&a));
        assert_ne!(manifest_hash(&a), manifest_hash(&b));
    }

    #[test]
    fn reference_parsing() {
        assert_eq!(
            SourceSetId::parse_reference("common", "hello"),
            SourceSetId::new("hello", "common")
        );
        assert_eq!(
            SourceSetId::parse_reference("libs/core/main", "hello"),
            SourceSetId::new("libs/core", "main")
        );
        assert_eq!(SourceSetId::new("hello", "main").qualified(), "hello/main");
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let err = read_manifest(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(matches!(err, ParamsError::Io { .. }));
    }
}

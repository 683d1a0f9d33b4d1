//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::FolioConfig;
use folio_attrs::Format;
use folio_common::RelPath;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of every configuration file.
pub const CONFIG_FILE: &str = "folio.toml";

/// A loaded workspace: its root configuration and every member unit.
#[derive(Debug)]
pub struct Workspace {
    /// Absolute workspace root.
    pub root: PathBuf,
    /// The root `folio.toml`.
    pub config: FolioConfig,
    /// Every build unit, in member order (the root first when it is a unit).
    pub units: Vec<UnitSource>,
}

/// One build unit's location and parsed configuration.
#[derive(Debug)]
pub struct UnitSource {
    /// Workspace-relative directory with `/` separators, `.` for the root.
    pub id: String,
    /// Absolute unit directory.
    pub dir: PathBuf,
    /// The unit's `folio.toml`.
    pub config: FolioConfig,
}

impl Workspace {
    /// Upper bound on concurrently running steps.
    pub fn jobs(&self) -> usize {
        self.config.workspace.as_ref().map_or(1, |w| w.jobs)
    }

    /// Looks up a unit by id.
    pub fn unit(&self, id: &str) -> Option<&UnitSource> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Maps a directory (absolute or relative to the root) to its unit id.
    pub fn unit_for_dir(&self, dir: &Path) -> Result<&UnitSource, ConfigError> {
        let absolute = crate::resolve::normalize(&self.root.join(dir));
        self.units
            .iter()
            .find(|u| u.dir == absolute)
            .ok_or_else(|| ConfigError::UnknownUnit(dir.display().to_string()))
    }
}

/// Loads and validates `<dir>/folio.toml`.
///
/// Validation errors name the unit by its directory name.
pub fn load_config(dir: &Path) -> Result<FolioConfig, ConfigError> {
    let label = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::resolve::ROOT_UNIT.to_string());
    load_labeled(dir, &label)
}

fn load_labeled(dir: &Path, label: &str) -> Result<FolioConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::IoError {
        path: path.clone(),
        source,
    })?;
    let config = parse(&content, &path.display().to_string())?;
    validate_config(&config, label)?;
    Ok(config)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<FolioConfig, ConfigError> {
    let config = parse(content, "<inline>")?;
    validate_config(&config, "<inline>")?;
    Ok(config)
}

/// Loads the workspace rooted at `root`.
///
/// A root without `[workspace]` must itself be a build unit. A root with both
/// is a unit as well as a workspace.
pub fn load_workspace(root: &Path) -> Result<Workspace, ConfigError> {
    let root = crate::resolve::normalize(root);
    let config = load_labeled(&root, crate::resolve::ROOT_UNIT)?;
    if config.workspace.is_none() && config.unit.is_none() {
        return Err(ConfigError::MissingField {
            unit: crate::resolve::ROOT_UNIT.to_string(),
            field: "workspace or unit".to_string(),
        });
    }

    let mut units = Vec::new();
    if config.unit.is_some() {
        units.push(UnitSource {
            id: crate::resolve::ROOT_UNIT.to_string(),
            dir: root.clone(),
            config: config.clone(),
        });
    }

    let members = config
        .workspace
        .as_ref()
        .map(|w| w.members.clone())
        .unwrap_or_default();
    for member in members {
        let rel = RelPath::new(&member)
            .map_err(|e| ConfigError::invalid(".", "workspace.members", e.to_string()))?;
        let id = rel.as_str().to_string();
        if units.iter().any(|u: &UnitSource| u.id == id) {
            return Err(ConfigError::DuplicateUnit(id));
        }
        let dir = rel.resolve(&root);
        let unit_config = load_labeled(&dir, &id)?;
        if unit_config.unit.is_none() {
            return Err(ConfigError::MissingField {
                unit: id,
                field: "unit".to_string(),
            });
        }
        debug!(unit = %id, dir = %dir.display(), "loaded build unit");
        units.push(UnitSource {
            id,
            dir,
            config: unit_config,
        });
    }

    Ok(Workspace {
        root,
        config,
        units,
    })
}

fn parse(content: &str, origin: &str) -> Result<FolioConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        origin: origin.to_string(),
        message: e.to_string(),
    })
}

/// Validates field values that serde cannot check on its own.
fn validate_config(config: &FolioConfig, unit: &str) -> Result<(), ConfigError> {
    if let Some(workspace) = &config.workspace {
        if workspace.jobs == 0 {
            return Err(ConfigError::invalid(unit, "workspace.jobs", "must be at least 1"));
        }
    }

    if let Some(engine) = &config.engine {
        for (field, value) in [("engine.min_heap", &engine.min_heap), ("engine.max_heap", &engine.max_heap)] {
            if let Some(size) = value {
                if !is_heap_size(size) {
                    return Err(ConfigError::invalid(
                        unit,
                        field,
                        format!("'{size}' is not a size like 512m or 2g"),
                    ));
                }
            }
        }
        if engine.java.is_empty() && engine.program.is_empty() {
            return Err(ConfigError::MissingField {
                unit: unit.to_string(),
                field: "engine.java".to_string(),
            });
        }
    }

    for name in config.formats.keys() {
        Format::new(name).map_err(|e| ConfigError::invalid(unit, "formats", e.to_string()))?;
    }

    if let Some(meta) = &config.unit {
        if matches!(meta.name.as_deref(), Some("")) {
            return Err(ConfigError::MissingField {
                unit: unit.to_string(),
                field: "unit.name".to_string(),
            });
        }
        if let Some(path) = &meta.path {
            RelPath::new(path).map_err(|e| ConfigError::invalid(unit, "unit.path", e.to_string()))?;
        }
        let mut seen = BTreeSet::new();
        for format in &meta.formats {
            Format::new(format)
                .map_err(|e| ConfigError::invalid(unit, "unit.formats", e.to_string()))?;
            if !seen.insert(format.as_str()) {
                return Err(ConfigError::invalid(
                    unit,
                    "unit.formats",
                    format!("'{format}' is listed more than once"),
                ));
            }
        }
    }

    for (name, source_set) in &config.source_sets {
        if name.is_empty() || name.contains('/') {
            return Err(ConfigError::invalid(
                unit,
                "source_sets",
                format!("'{name}' is not a valid source-set name"),
            ));
        }
        for (i, link) in source_set.source_links.iter().enumerate() {
            if link.remote_url.is_empty() {
                return Err(ConfigError::MissingField {
                    unit: unit.to_string(),
                    field: format!("source_sets.{name}.source_links[{i}].remote_url"),
                });
            }
        }
        for (i, link) in source_set.external_links.iter().enumerate() {
            if link.url.is_empty() {
                return Err(ConfigError::MissingField {
                    unit: unit.to_string(),
                    field: format!("source_sets.{name}.external_links[{i}].url"),
                });
            }
        }
        for (i, package) in source_set.per_package.iter().enumerate() {
            if package.matching_regex.is_empty() {
                return Err(ConfigError::MissingField {
                    unit: unit.to_string(),
                    field: format!("source_sets.{name}.per_package[{i}].matching_regex"),
                });
            }
        }
    }

    for (i, plugin) in config.plugins.iter().enumerate() {
        if plugin.id.is_empty() {
            return Err(ConfigError::MissingField {
                unit: unit.to_string(),
                field: format!("plugin[{i}].id"),
            });
        }
    }
    Ok(())
}

fn is_heap_size(s: &str) -> bool {
    let digits = s.trim_end_matches(|c: char| "kKmMgG".contains(c));
    !digits.is_empty() && s.len() - digits.len() <= 1 && digits.chars().all(|c| c.is_ascii_digit())
}

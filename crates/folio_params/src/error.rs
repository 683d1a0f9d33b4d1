//! Error types for manifest construction and serialization.

use std::path::PathBuf;

/// Errors raised while building, writing, or reading a parameter manifest.
///
/// Build errors are user configuration errors and name the build unit and
/// the offending field or identifier.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    /// Two `[[plugin]]` blocks share an identifier.
    #[error("build unit '{unit}': plugin '{plugin_id}' is configured more than once")]
    DuplicatePlugin {
        /// The build unit.
        unit: String,
        /// The repeated plugin identifier.
        plugin_id: String,
    },

    /// A plugin's values could not be encoded as JSON.
    #[error("build unit '{unit}': cannot encode values of plugin '{plugin_id}': {source}")]
    PluginValues {
        /// The build unit.
        unit: String,
        /// The plugin identifier.
        plugin_id: String,
        /// The encoder error.
        source: serde_json::Error,
    },

    /// A `depends_on` entry names a source set the unit does not have.
    #[error("build unit '{unit}': source set '{source_set}' depends on unknown source set '{reference}'")]
    UnknownSourceSet {
        /// The build unit.
        unit: String,
        /// The depending source set.
        source_set: String,
        /// The unresolved reference.
        reference: String,
    },

    /// Source-set dependencies form a cycle.
    #[error("build unit '{unit}': source set '{source_set}' is part of a dependency cycle")]
    DependencyCycle {
        /// The build unit.
        unit: String,
        /// A source set on the cycle.
        source_set: String,
    },

    /// A required manifest field is empty.
    #[error("build unit '{unit}': missing required field '{field}'")]
    MissingField {
        /// The build unit.
        unit: String,
        /// The manifest field.
        field: String,
    },

    /// The manifest could not be encoded or decoded.
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The manifest file could not be read or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// The manifest path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

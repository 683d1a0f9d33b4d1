//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating `folio.toml` files.
///
/// Validation errors always name the build unit (its workspace-relative
/// directory) and the offending field.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading a configuration file.
    #[error("failed to read '{}': {source}", path.display())]
    IoError {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse {origin}: {message}")]
    ParseError {
        /// The file (or `<inline>`) being parsed.
        origin: String,
        /// The parser message.
        message: String,
    },

    /// A required field is missing or empty.
    #[error("build unit '{unit}': missing required field '{field}'")]
    MissingField {
        /// The build unit.
        unit: String,
        /// The dotted field name.
        field: String,
    },

    /// A configuration value failed validation.
    #[error("build unit '{unit}': invalid {field}: {message}")]
    ValidationError {
        /// The build unit.
        unit: String,
        /// The dotted field name.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A requested build unit is not part of the workspace.
    #[error("unknown build unit '{0}'")]
    UnknownUnit(String),

    /// Two workspace members resolve to the same directory.
    #[error("build unit '{0}' is listed more than once")]
    DuplicateUnit(String),
}

impl ConfigError {
    pub(crate) fn invalid(unit: &str, field: &str, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            unit: unit.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

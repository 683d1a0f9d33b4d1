//! Error types for aggregation.

use folio_common::RelPathError;
use std::path::PathBuf;

/// Errors produced while aggregating modules.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// Two modules share a name.
    #[error("unit '{unit}': module name '{name}' is used by more than one module dependency")]
    DuplicateModuleName {
        /// The aggregating unit.
        unit: String,
        /// The repeated name.
        name: String,
    },

    /// Two modules would be nested at the same path.
    #[error("unit '{unit}': module path '{path}' is used by both '{first}' and '{second}'")]
    DuplicateModulePath {
        /// The aggregating unit.
        unit: String,
        /// The repeated path.
        path: String,
        /// The first module using it.
        first: String,
        /// The second module using it.
        second: String,
    },

    /// A module path is not a valid relative path.
    #[error("unit '{unit}': invalid path for module '{module}': {source}")]
    InvalidModulePath {
        /// The aggregating unit.
        unit: String,
        /// The module.
        module: String,
        /// Why the path is invalid.
        source: RelPathError,
    },

    /// Filesystem failure.
    #[error("aggregation I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A root artifact could not be encoded.
    #[error("failed to encode navigation: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AggregateError {
    pub(crate) fn io(path: &std::path::Path) -> impl Fn(std::io::Error) -> AggregateError + '_ {
        move |source| AggregateError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_path_names_both_modules() {
        let err = AggregateError::DuplicateModulePath {
            unit: "docs".to_string(),
            path: "lib".to_string(),
            first: "hello".to_string(),
            second: "goodbye".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'hello'"));
        assert!(msg.contains("'goodbye'"));
        assert!(msg.contains("unit 'docs'"));
    }
}

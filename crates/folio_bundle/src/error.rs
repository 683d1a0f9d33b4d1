//! Error types for packaging and reading bundles.

use folio_common::RelPathError;
use std::path::PathBuf;

/// Errors produced while packaging or opening a component bundle.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Filesystem failure.
    #[error("bundle I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The module output to package does not exist.
    #[error("unit '{unit}': module output {} does not exist; generate the module first", path.display())]
    MissingModuleOutput {
        /// The packaging unit.
        unit: String,
        /// The expected output directory.
        path: PathBuf,
    },

    /// A path named by the descriptor is missing from the bundle.
    ///
    /// The producing packaging step must run again.
    #[error("stale component bundle at {}: '{path}' is missing", bundle.display())]
    Stale {
        /// The bundle root.
        bundle: PathBuf,
        /// The missing bundle-relative path.
        path: String,
    },

    /// The descriptor could not be parsed or has an unsupported version.
    #[error("invalid component descriptor {}: {reason}", path.display())]
    Descriptor {
        /// The descriptor file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// A computed bundle path is not a valid relative path.
    #[error("invalid bundle path: {0}")]
    Path(#[from] RelPathError),

    /// A descriptor could not be encoded.
    #[error("failed to encode descriptor: {0}")]
    Encode(#[from] serde_json::Error),
}

impl BundleError {
    /// Returns `true` for errors that call for re-running the producer.
    pub fn is_stale(&self) -> bool {
        matches!(self, BundleError::Stale { .. })
    }

    pub(crate) fn io(path: &std::path::Path) -> impl Fn(std::io::Error) -> BundleError + '_ {
        move |source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_display_names_path() {
        let err = BundleError::Stale {
            bundle: PathBuf::from("/w/hello/build/folio/html/component"),
            path: "module".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("stale component bundle"));
        assert!(msg.contains("'module'"));
        assert!(err.is_stale());
    }

    #[test]
    fn missing_output_names_unit() {
        let err = BundleError::MissingModuleOutput {
            unit: "hello".to_string(),
            path: PathBuf::from("/w/hello/build/folio/html/module"),
        };
        assert!(err.to_string().contains("unit 'hello'"));
        assert!(!err.is_stale());
    }
}

//! Error types for engine runs.

use crate::state::WorkerState;
use folio_params::ParamsError;
use std::path::PathBuf;

/// Errors produced by a generation run.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// No generator classpath was resolved, so the engine cannot start.
    #[error("unit '{unit}': generator classpath for format '{format}' is empty; configure [engine] classpath or format plugins")]
    EmptyClasspath {
        /// The generating unit.
        unit: String,
        /// The requested format.
        format: String,
    },

    /// A classpath entry contains the platform path separator.
    #[error("unit '{unit}': generator classpath entry contains the path separator")]
    InvalidClasspath {
        /// The generating unit.
        unit: String,
    },

    /// The manifest could not be written.
    #[error(transparent)]
    Manifest(#[from] ParamsError),

    /// Filesystem failure while preparing the run.
    #[error("worker I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The engine process could not be started.
    #[error("failed to start engine '{program}': {source}")]
    Spawn {
        /// The launcher program.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The engine exited unsuccessfully.
    #[error("unit '{unit}': engine failed ({status}); see {}\n{tail}", log.display())]
    EngineFailed {
        /// The generating unit.
        unit: String,
        /// Exit code or signal description.
        status: String,
        /// The dedicated engine log.
        log: PathBuf,
        /// The last lines of the log.
        tail: String,
    },

    /// The run was cancelled and the engine process killed.
    #[error("unit '{unit}': generation cancelled")]
    Cancelled {
        /// The generating unit.
        unit: String,
    },

    /// A worker was driven out of order.
    #[error("worker cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: WorkerState,
        /// Requested state.
        to: WorkerState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failure_names_log_and_tail() {
        let err = WorkerError::EngineFailed {
            unit: "hello".to_string(),
            status: "exit code 3".to_string(),
            log: PathBuf::from("/w/hello/build/folio/html/work/module/engine.log"),
            tail: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 3"));
        assert!(msg.contains("engine.log"));
        assert!(msg.ends_with("boom"));
    }

    #[test]
    fn empty_classpath_names_unit_and_format() {
        let err = WorkerError::EmptyClasspath {
            unit: "docs".to_string(),
            format: "html".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'docs'"));
        assert!(msg.contains("'html'"));
    }
}

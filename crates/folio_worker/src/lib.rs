//! The generation worker.
//!
//! A [`GenerationWorker`] writes a parameter manifest to disk and runs the
//! engine on it exactly once in a separate process. The process gets a
//! cleared environment, a classpath built only from the resolved generator
//! classpath, and a dedicated log file. There is no retry: a non-zero exit
//! is reported with the log path and its last lines.

#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod log;
pub mod state;
pub mod worker;

pub use command::{EngineCommand, ALLOWED_ENV_VARS, CLASSPATH_ENV};
pub use error::WorkerError;
pub use log::tail;
pub use state::WorkerState;
pub use worker::{
    never_cancelled, GenerationOutcome, GenerationRequest, GenerationWorker, LOG_FILE, MANIFEST_FILE,
};

//! Up-to-date checks for orchestration steps.
//!
//! A [`StepCache`] remembers, per step id, the hash of the step's serialized
//! inputs and the [`DirectoryDigest`] of the output it produced. A step whose
//! inputs are unchanged and whose output is still intact can be skipped.
//! Every read is fail-safe: a missing or corrupt cache is a miss.

#![warn(missing_docs)]

pub mod cache;
pub mod digest;
pub mod error;
pub mod manifest;

pub use cache::StepCache;
pub use digest::{ChangeSet, DirectoryDigest};
pub use error::CacheError;
pub use manifest::{StepManifest, StepRecord};

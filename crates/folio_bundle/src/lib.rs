//! Component bundles.
//!
//! A bundle is the directory a build unit hands to other units through the
//! channel registry. It holds the unit's generated module output, its
//! top-level includes and every non-suppressed source set's files, plus a
//! `component.json` descriptor whose paths are all relative to the bundle
//! root. Packaging mirrors a [`SyncPlan`] into the bundle directory:
//! stale files are deleted and unchanged files are left untouched, so
//! repeated packaging yields a byte-identical tree.

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod plan;
pub mod reader;
pub mod spec;
mod sync;

pub use descriptor::{ComponentDescriptor, SourceSetEntry, DESCRIPTOR_VERSION};
pub use error::BundleError;
pub use plan::{Entry, SyncPlan};
pub use reader::{BundledSourceSet, ComponentBundle};
pub use spec::{BundleSpec, SourceSetInputs};
pub use sync::SyncReport;

/// Descriptor file at the bundle root.
pub const DESCRIPTOR_FILE: &str = "component.json";
/// Minimal `{name, modulePath}` file exchanged between units.
pub const MODULE_DESCRIPTOR_FILE: &str = "module-descriptor.json";
/// Directory holding the generated module output.
pub const MODULE_DIR: &str = "module";
/// Directory holding the unit's top-level include files.
pub const INCLUDES_DIR: &str = "includes";
/// Directory holding one subdirectory per source set.
pub const SOURCE_SETS_DIR: &str = "source-sets";

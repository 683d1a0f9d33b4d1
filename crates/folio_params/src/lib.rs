//! The generation parameter manifest and the builder that produces it.
//!
//! [`ManifestBuilder`] turns a [`folio_config::ResolvedUnit`] plus the files
//! resolved through the channel registry into a [`ParameterManifest`]. The
//! manifest is plain data: once written it is the engine's only input, and
//! identical inputs always serialize to identical bytes.

#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod links;
pub mod manifest;

pub use builder::{normalize_version, GenerationMode, ManifestBuilder};
pub use error::ParamsError;
pub use manifest::{
    manifest_hash, read_manifest, to_json, write_manifest, AnalysisPlatform, DocumentedVisibility,
    ExternalLink, ModuleDescriptor, ModuleManifest, PackageOptions, ParameterManifest,
    PluginConfiguration, SourceLink, SourceSetId, SourceSetManifest,
};

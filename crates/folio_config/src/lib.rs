//! Parsing and validation of `folio.toml` configuration files.
//!
//! A workspace root lists member build units; each unit directory carries its
//! own `folio.toml`. Loading produces strongly-typed [`FolioConfig`] values,
//! and [`Workspace::resolve_units`] merges workspace defaults into one
//! [`ResolvedUnit`] per build unit with every path made absolute.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    load_config, load_config_from_str, load_workspace, UnitSource, Workspace, CONFIG_FILE,
};
pub use resolve::{
    resolve_unit, ResolvedEngine, ResolvedSourceLink, ResolvedSourceSet, ResolvedUnit, ROOT_UNIT,
};
pub use types::*;

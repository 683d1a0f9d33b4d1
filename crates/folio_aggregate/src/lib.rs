//! Publication aggregation.
//!
//! Before an aggregation run, [`validate_modules`] rejects duplicate module
//! names and paths, and [`check_aggregation_plugin`] warns when several
//! modules are combined without the engine's all-modules plugin. After the
//! engine ran, the [`Aggregator`] nests every module's output under its
//! module path and writes the merged root artifacts: `package-list`,
//! `navigation.json`, and a fallback index when the engine wrote none.

#![warn(missing_docs)]

pub mod assemble;
pub mod error;
pub mod index;
pub mod package_list;
pub mod validate;

pub use assemble::{AggregateReport, Aggregator, NAVIGATION_FILE};
pub use error::AggregateError;
pub use package_list::{merge_package_lists, ModulePackages, PACKAGE_LIST_FILE};
pub use validate::{check_aggregation_plugin, validate_modules, AGGREGATION_PLUGIN};

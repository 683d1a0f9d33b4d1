//! Typed attribute tags for artifact channels and the rules that match them.
//!
//! Every artifact channel is tagged with an [`AttributeSet`]: an output
//! [`Format`], a [`ComponentKind`], and optionally a source-set id and a
//! module id. [`schema`] decides whether a producer's tags satisfy a
//! consumer's request and which of several compatible producers is closest.

#![warn(missing_docs)]

pub mod attribute;
pub mod error;
pub mod format;
pub mod schema;

pub use attribute::{Attribute, AttributeKey, AttributeSet, ComponentKind};
pub use error::AttrError;
pub use format::Format;
pub use schema::{check_attribute, compatibility, disambiguate, Compatibility, ProducerScope};

//! Artifact channel registry.
//!
//! Each build unit owns named producer and consumer channels tagged with
//! attributes. Producers publish artifacts (paths that a preparation step will
//! fill); consumers pull the union of compatible artifacts from the units they
//! depend on. Resolution is lenient: a dependency that publishes nothing for a
//! request contributes an empty set instead of failing.

#![warn(missing_docs)]

pub mod channel;
pub mod error;
pub mod registry;

pub use channel::{Artifact, Channel, Direction, UnitId};
pub use error::ChannelError;
pub use registry::{channel_name, ChannelRegistry, Mismatch, Resolution, ResolveRequest, BASE_CHANNEL};

//! Shared foundational types used across the Folio documentation orchestrator.
//!
//! This crate provides content hashing for cache keys and idempotence checks,
//! plus validated bundle-relative paths.

#![warn(missing_docs)]

pub mod hash;
pub mod relpath;

pub use hash::{ContentHash, ContentHasher};
pub use relpath::{RelPath, RelPathError};

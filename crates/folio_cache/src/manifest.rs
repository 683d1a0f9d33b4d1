//! The persisted record of completed steps.
//!
//! Stored as `steps.json` in the cache directory.

use std::collections::BTreeMap;
use std::path::Path;

use folio_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Name of the manifest file within the cache directory.
const MANIFEST_FILE: &str = "steps.json";

/// Every recorded step, keyed by step id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepManifest {
    /// Folio version that produced this cache. Invalidate on version change.
    pub folio_version: String,
    /// Per-step state.
    pub steps: BTreeMap<String, StepRecord>,
}

/// What a step consumed and produced the last time it succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Hash of the step's serialized inputs.
    pub input_hash: ContentHash,
    /// Combined digest of the step's output directory.
    pub output_digest: ContentHash,
}

impl StepManifest {
    /// Creates an empty manifest.
    pub fn new(folio_version: &str) -> Self {
        Self {
            folio_version: folio_version.to_string(),
            steps: BTreeMap::new(),
        }
    }

    /// Loads the manifest, returning `None` if it is missing or unreadable.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(cache_dir.join(MANIFEST_FILE)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Saves the manifest, creating the cache directory if needed.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let path = cache_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns `true` if this manifest was produced by a compatible version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.folio_version == current_version
    }
}

//! The step cache used by the host to skip unchanged steps.

use std::path::{Path, PathBuf};

use folio_common::ContentHash;
use tracing::debug;

use crate::digest::DirectoryDigest;
use crate::error::CacheError;
use crate::manifest::{StepManifest, StepRecord};

/// Skips steps whose inputs are unchanged and whose output is intact.
///
/// All reads are fail-safe: corruption or version mismatches result in
/// cache misses rather than errors.
pub struct StepCache {
    cache_dir: PathBuf,
    manifest: StepManifest,
}

impl StepCache {
    /// Loads an existing cache or starts an empty one.
    pub fn load_or_create(cache_dir: &Path, folio_version: &str) -> Self {
        let manifest = StepManifest::load(cache_dir)
            .filter(|m| m.is_compatible(folio_version))
            .unwrap_or_else(|| StepManifest::new(folio_version));
        Self {
            cache_dir: cache_dir.to_path_buf(),
            manifest,
        }
    }

    /// Returns `true` if `step` last ran with `input_hash` and `output_dir`
    /// still holds exactly what it produced.
    pub fn is_fresh(&self, step: &str, input_hash: ContentHash, output_dir: &Path) -> bool {
        match self.recorded(step) {
            Some(record) => record.matches(step, input_hash, output_dir),
            None => {
                debug!(step, "cache miss: never recorded");
                false
            }
        }
    }

    /// Records a successful run of `step`.
    pub fn record(
        &mut self,
        step: &str,
        input_hash: ContentHash,
        output_dir: &Path,
    ) -> Result<(), CacheError> {
        let record = StepRecord::capture(input_hash, output_dir)?;
        self.insert(step, record);
        Ok(())
    }

    /// The last record of `step`, if any.
    ///
    /// Together with [`StepRecord::matches`] and [`insert`](Self::insert)
    /// this lets callers sharing the cache digest outputs without holding it.
    pub fn recorded(&self, step: &str) -> Option<StepRecord> {
        self.manifest.steps.get(step).cloned()
    }

    /// Stores a record captured with [`StepRecord::capture`].
    pub fn insert(&mut self, step: &str, record: StepRecord) {
        self.manifest.steps.insert(step.to_string(), record);
    }

    /// Forgets `step`, forcing it to run next time.
    pub fn invalidate(&mut self, step: &str) {
        self.manifest.steps.remove(step);
    }

    /// Forgets every step.
    pub fn clear(&mut self) {
        self.manifest.steps.clear();
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.manifest.steps.len()
    }

    /// Returns `true` if no step is recorded.
    pub fn is_empty(&self) -> bool {
        self.manifest.steps.is_empty()
    }

    /// Writes the manifest to disk.
    pub fn save(&self) -> Result<(), CacheError> {
        self.manifest.save(&self.cache_dir)
    }
}

impl StepRecord {
    /// Digests `output_dir` for a run with `input_hash`.
    pub fn capture(input_hash: ContentHash, output_dir: &Path) -> Result<Self, CacheError> {
        Ok(Self {
            input_hash,
            output_digest: DirectoryDigest::compute(output_dir)?.combined(),
        })
    }

    /// Returns `true` if this record was made with `input_hash` and
    /// `output_dir` is unchanged since.
    pub fn matches(&self, step: &str, input_hash: ContentHash, output_dir: &Path) -> bool {
        if self.input_hash != input_hash {
            debug!(step, "cache miss: inputs changed");
            return false;
        }
        match DirectoryDigest::compute(output_dir) {
            Ok(digest) if digest.combined() == self.output_digest => true,
            _ => {
                debug!(step, output = %output_dir.display(), "cache miss: output changed or missing");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION: &str = "0.1.0";

    fn output(root: &Path) -> PathBuf {
        let out = root.join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("index.html"), "<html/>").unwrap();
        out
    }

    #[test]
    fn recorded_step_is_fresh_across_reloads() {
        let tmp = tempfile::tempdir().unwrap();
        let out = output(tmp.path());
        let input = ContentHash::from_bytes(b"manifest");

        let mut cache = StepCache::load_or_create(&tmp.path().join("cache"), VERSION);
        assert!(!cache.is_fresh("s", input, &out));
        cache.record("s", input, &out).unwrap();
        cache.save().unwrap();

        let reloaded = StepCache::load_or_create(&tmp.path().join("cache"), VERSION);
        assert!(reloaded.is_fresh("s", input, &out));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn changed_input_is_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let out = output(tmp.path());
        let mut cache = StepCache::load_or_create(tmp.path(), VERSION);
        cache.record("s", ContentHash::from_bytes(b"a"), &out).unwrap();
        assert!(!cache.is_fresh("s", ContentHash::from_bytes(b"b"), &out));
    }

    #[test]
    fn tampered_output_is_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let out = output(tmp.path());
        let input = ContentHash::from_bytes(b"a");
        let mut cache = StepCache::load_or_create(tmp.path(), VERSION);
        cache.record("s", input, &out).unwrap();

        std::fs::write(out.join("stray.html"), "partial").unwrap();
        assert!(!cache.is_fresh("s", input, &out));

        std::fs::remove_dir_all(&out).unwrap();
        assert!(!cache.is_fresh("s", input, &out));
    }

    #[test]
    fn version_change_discards_records() {
        let tmp = tempfile::tempdir().unwrap();
        let out = output(tmp.path());
        let mut cache = StepCache::load_or_create(tmp.path(), VERSION);
        cache.record("s", ContentHash::from_bytes(b"a"), &out).unwrap();
        cache.save().unwrap();

        let newer = StepCache::load_or_create(tmp.path(), "9.9.9");
        assert!(newer.is_empty());
    }

    #[test]
    fn invalidate_and_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let out = output(tmp.path());
        let input = ContentHash::from_bytes(b"a");
        let mut cache = StepCache::load_or_create(tmp.path(), VERSION);
        cache.record("a", input, &out).unwrap();
        cache.record("b", input, &out).unwrap();
        cache.invalidate("a");
        assert!(!cache.is_fresh("a", input, &out));
        assert!(cache.is_fresh("b", input, &out));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn captured_record_checks_outside_the_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let out = output(tmp.path());
        let input = ContentHash::from_bytes(b"a");
        let mut cache = StepCache::load_or_create(tmp.path(), VERSION);
        assert!(cache.recorded("s").is_none());

        let record = StepRecord::capture(input, &out).unwrap();
        cache.insert("s", record);
        let recorded = cache.recorded("s").unwrap();
        assert!(recorded.matches("s", input, &out));
        assert!(!recorded.matches("s", ContentHash::from_bytes(b"b"), &out));
        assert!(cache.is_fresh("s", input, &out));
    }
}

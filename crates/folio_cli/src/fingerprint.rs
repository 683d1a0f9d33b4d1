//! Cache keys for host steps.
//!
//! A key covers the serialized step input plus the current content of every
//! path that input refers to, so editing a source file invalidates the step
//! even though the manifest bytes stay the same.

use std::path::{Path, PathBuf};

use folio_cache::{CacheError, DirectoryDigest};
use folio_common::{ContentHash, ContentHasher};
use folio_config::ResolvedEngine;
use folio_params::ParameterManifest;

/// Every input path a generation run reads.
pub fn manifest_inputs(manifest: &ParameterManifest, generator: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for ss in &manifest.source_sets {
        paths.extend(ss.source_roots.iter().cloned());
        paths.extend(ss.classpath.iter().cloned());
        paths.extend(ss.samples.iter().cloned());
        paths.extend(ss.includes.iter().cloned());
        paths.extend(ss.suppressed_files.iter().cloned());
    }
    for module in &manifest.modules {
        paths.push(module.source_output_directory.clone());
        paths.extend(module.includes.iter().cloned());
    }
    paths.extend(manifest.includes.iter().cloned());
    paths.extend(manifest.plugins_classpath.iter().cloned());
    paths.extend(generator.iter().cloned());
    paths
}

/// Engine settings in the form folded into generation keys.
pub fn engine_key(engine: &ResolvedEngine) -> Result<String, serde_json::Error> {
    serde_json::to_string(engine)
}

/// Hashes `input` together with the content of `paths`.
///
/// Missing paths hash to a fixed marker so that creating one later changes
/// the key.
pub fn fingerprint(input: &[u8], paths: &[PathBuf], extra: &[&str]) -> Result<ContentHash, CacheError> {
    let mut hasher = ContentHasher::new();
    hasher.update(b"input").update(input);
    for value in extra {
        hasher.update(b"extra").update(value.as_bytes());
    }
    for path in paths {
        hasher
            .update(b"path")
            .update(path.to_string_lossy().as_bytes())
            .update(path_hash(path)?.as_bytes());
    }
    Ok(hasher.finish())
}

fn path_hash(path: &Path) -> Result<ContentHash, CacheError> {
    if path.is_dir() {
        Ok(DirectoryDigest::compute(path)?.combined())
    } else if path.is_file() {
        let bytes = std::fs::read(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ContentHash::from_bytes(&bytes))
    } else {
        Ok(ContentHash::from_bytes(b"<missing>"))
    }
}
